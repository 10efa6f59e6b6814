// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Secure sketch over a binary BCH code
//!
//! Enrollment publishes the odd syndromes of the reference response as
//! helper data. Reconstruction XORs them with the syndromes of a fresh noisy
//! measurement, which leaves the syndromes of the noise pattern alone; the
//! BCH decoder locates those bit positions and flips them back.
//!
//! A truncated SHA3-256 tag over the reference rejects miscorrections, so a
//! response more than `t` bits away is reported as `CorrectionFailed` rather
//! than decoded to a different word.

use heapless::Vec;
use q_common::constants::{HELPER_CHECK_SIZE, MAX_HELPER_DATA_SIZE};
use q_common::{CodeConfig, Error, ResponseBits, Result};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bch::{BchDecoder, Syndromes};

/// Helper data format version
pub const HELPER_DATA_VERSION: u8 = 1;

/// Fixed bytes ahead of the syndromes: version, m, n (LE), t
const HELPER_HEADER_SIZE: usize = 5;

const CHECK_DOMAIN: &[u8] = b"q-fuzzy/bch-sketch/check/v1";

/// Serialized helper data
pub type HelperBytes = Vec<u8, MAX_HELPER_DATA_SIZE>;

/// Public helper data for one enrolled response
///
/// Wire layout: `[version:1][m:1][n:2 LE][t:1][syndromes: t x 2 LE][check:16]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperData {
    params: CodeConfig,
    syndromes: Syndromes,
    check: [u8; HELPER_CHECK_SIZE],
}

impl HelperData {
    /// Code parameters the helper data was produced with
    #[must_use]
    pub const fn params(&self) -> CodeConfig {
        self.params
    }

    /// Odd syndromes `S_1, S_3, ..., S_{2t-1}` of the reference
    #[must_use]
    pub fn syndromes(&self) -> &[u16] {
        &self.syndromes
    }

    /// Serialized length for the given parameters
    #[must_use]
    pub const fn encoded_len(params: &CodeConfig) -> usize {
        HELPER_HEADER_SIZE + 2 * params.correction_radius as usize + HELPER_CHECK_SIZE
    }

    /// Serialize to bytes
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if the encoding exceeds capacity.
    pub fn to_bytes(&self) -> Result<HelperBytes> {
        let mut out = HelperBytes::new();
        let n = self.params.block_length.to_le_bytes();
        out.extend_from_slice(&[
            HELPER_DATA_VERSION,
            self.params.field_degree,
            n[0],
            n[1],
            self.params.correction_radius,
        ])
        .map_err(|()| Error::BufferTooSmall)?;
        for s in &self.syndromes {
            out.extend_from_slice(&s.to_le_bytes())
                .map_err(|()| Error::BufferTooSmall)?;
        }
        out.extend_from_slice(&self.check)
            .map_err(|()| Error::BufferTooSmall)?;
        Ok(out)
    }

    /// Parse from bytes
    ///
    /// # Errors
    ///
    /// Returns `HelperDataMismatch` for a wrong version, length or
    /// out-of-field syndrome and `InvalidCodeParameters` for unsupported
    /// code parameters.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HELPER_HEADER_SIZE || bytes[0] != HELPER_DATA_VERSION {
            return Err(Error::HelperDataMismatch);
        }
        let params = CodeConfig::new(
            bytes[1],
            u16::from_le_bytes([bytes[2], bytes[3]]),
            bytes[4],
        );
        params.validate()?;
        if bytes.len() != Self::encoded_len(&params) {
            return Err(Error::HelperDataMismatch);
        }

        let t = params.correction_radius as usize;
        let body = &bytes[HELPER_HEADER_SIZE..HELPER_HEADER_SIZE + 2 * t];
        let mut syndromes = Syndromes::new();
        for chunk in body.chunks_exact(2) {
            let s = u16::from_le_bytes([chunk[0], chunk[1]]);
            if s as usize > params.field_order() {
                return Err(Error::HelperDataMismatch);
            }
            syndromes.push(s).map_err(|_| Error::HelperDataMismatch)?;
        }

        let mut check = [0u8; HELPER_CHECK_SIZE];
        check.copy_from_slice(&bytes[HELPER_HEADER_SIZE + 2 * t..]);

        Ok(Self {
            params,
            syndromes,
            check,
        })
    }
}

/// Reconstructed response, zeroized on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Codeword(ResponseBits);

impl Codeword {
    /// Corrected bits
    #[must_use]
    pub fn as_bits(&self) -> &ResponseBits {
        &self.0
    }

    /// Packed bytes, the input to key derivation
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl core::fmt::Debug for Codeword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Codeword([REDACTED; {} bits])", self.0.len())
    }
}

/// Error-correcting code used as a secure sketch
pub trait ErrorCorrectingCode {
    /// Code parameters
    fn params(&self) -> CodeConfig;

    /// Produce the codeword and public helper data for a reference response
    ///
    /// # Errors
    ///
    /// Returns `ResponseLengthMismatch` if `reference` is not `n` bits long.
    fn encode(&self, reference: &ResponseBits) -> Result<(Codeword, HelperData)>;

    /// Reconstruct the enrolled codeword from a noisy response
    ///
    /// # Errors
    ///
    /// Returns `CorrectionFailed` if `noisy` is more than `t` bits away from
    /// the reference, `ResponseLengthMismatch` for a wrong response length
    /// and `HelperDataMismatch` if `helper` was produced with other
    /// parameters.
    fn decode(&self, noisy: &ResponseBits, helper: &HelperData) -> Result<Codeword>;
}

impl<E: ErrorCorrectingCode + ?Sized> ErrorCorrectingCode for &E {
    fn params(&self) -> CodeConfig {
        (**self).params()
    }

    fn encode(&self, reference: &ResponseBits) -> Result<(Codeword, HelperData)> {
        (**self).encode(reference)
    }

    fn decode(&self, noisy: &ResponseBits, helper: &HelperData) -> Result<Codeword> {
        (**self).decode(noisy, helper)
    }
}

/// BCH syndrome secure sketch
pub struct BchSketch {
    params: CodeConfig,
    decoder: BchDecoder,
}

impl BchSketch {
    /// Create a sketch for the given parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidCodeParameters` if the parameters fail validation.
    pub fn new(params: CodeConfig) -> Result<Self> {
        Ok(Self {
            params,
            decoder: BchDecoder::new(params)?,
        })
    }

    fn check_tag(&self, bits: &ResponseBits) -> [u8; HELPER_CHECK_SIZE] {
        let mut hasher = Sha3_256::new();
        hasher.update(CHECK_DOMAIN);
        hasher.update([self.params.field_degree, self.params.correction_radius]);
        hasher.update(self.params.block_length.to_le_bytes());
        hasher.update(bits.as_bytes());
        let digest = hasher.finalize();

        let mut tag = [0u8; HELPER_CHECK_SIZE];
        tag.copy_from_slice(&digest[..HELPER_CHECK_SIZE]);
        tag
    }
}

impl ErrorCorrectingCode for BchSketch {
    fn params(&self) -> CodeConfig {
        self.params
    }

    fn encode(&self, reference: &ResponseBits) -> Result<(Codeword, HelperData)> {
        let syndromes = self.decoder.odd_syndromes(reference)?;
        let helper = HelperData {
            params: self.params,
            syndromes,
            check: self.check_tag(reference),
        };
        Ok((Codeword(reference.clone()), helper))
    }

    fn decode(&self, noisy: &ResponseBits, helper: &HelperData) -> Result<Codeword> {
        if helper.params != self.params {
            return Err(Error::HelperDataMismatch);
        }

        let mut error_syndromes = self.decoder.odd_syndromes(noisy)?;
        for (s, h) in error_syndromes.iter_mut().zip(helper.syndromes.iter()) {
            *s ^= h;
        }

        let positions = self.decoder.locate_errors(&error_syndromes)?;

        let mut corrected = noisy.clone();
        for &p in &positions {
            corrected.flip(p as usize);
        }

        if bool::from(self.check_tag(&corrected).ct_eq(&helper.check)) {
            Ok(Codeword(corrected))
        } else {
            Err(Error::CorrectionFailed)
        }
    }
}

/// Per-bit majority vote over an odd number of captures
///
/// # Errors
///
/// Returns `InvalidParameter` for an empty or even set of captures and
/// `ResponseLengthMismatch` if the captures differ in length.
pub fn majority_vote(captures: &[ResponseBits]) -> Result<ResponseBits> {
    let first = captures.first().ok_or(Error::InvalidParameter)?;
    if captures.len() % 2 == 0 {
        return Err(Error::InvalidParameter);
    }
    if captures.iter().any(|c| c.len() != first.len()) {
        return Err(Error::ResponseLengthMismatch);
    }

    let threshold = captures.len() / 2;
    let mut out = ResponseBits::zeroed(first.len())?;
    for i in 0..first.len() {
        let ones = captures.iter().map(|c| usize::from(c.bit(i))).sum::<usize>();
        out.set(i, ones > threshold);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize, seed: u8) -> ResponseBits {
        let mut bytes = [0u8; 128];
        let mut x = seed as u32 | 1;
        for b in &mut bytes {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            *b = (x >> 16) as u8;
        }
        ResponseBits::from_bytes(&bytes, len).unwrap()
    }

    #[test]
    fn test_helper_data_layout() {
        let sketch = BchSketch::new(CodeConfig::new(8, 255, 16)).unwrap();
        let (_, helper) = sketch.encode(&pattern(255, 7)).unwrap();
        let bytes = helper.to_bytes().unwrap();
        assert_eq!(bytes.len(), 5 + 32 + 16);
        assert_eq!(&bytes[..5], &[1, 8, 255, 0, 16]);
        assert_eq!(HelperData::from_bytes(&bytes).unwrap(), helper);
    }

    #[test]
    fn test_helper_data_rejects_garbage() {
        let sketch = BchSketch::new(CodeConfig::new(6, 63, 4)).unwrap();
        let (_, helper) = sketch.encode(&pattern(63, 1)).unwrap();
        let bytes = helper.to_bytes().unwrap();

        let mut bad_version = bytes.clone();
        bad_version[0] = 2;
        assert_eq!(
            HelperData::from_bytes(&bad_version).unwrap_err(),
            Error::HelperDataMismatch
        );

        assert_eq!(
            HelperData::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err(),
            Error::HelperDataMismatch
        );

        let mut bad_syndrome = bytes.clone();
        bad_syndrome[5] = 0xFF;
        bad_syndrome[6] = 0xFF;
        assert_eq!(
            HelperData::from_bytes(&bad_syndrome).unwrap_err(),
            Error::HelperDataMismatch
        );

        let mut bad_params = bytes;
        bad_params[1] = 12;
        assert_eq!(
            HelperData::from_bytes(&bad_params).unwrap_err(),
            Error::InvalidCodeParameters
        );
    }

    #[test]
    fn test_encode_returns_reference() {
        let sketch = BchSketch::new(CodeConfig::DEFAULT).unwrap();
        let reference = pattern(255, 3);
        let (codeword, _) = sketch.encode(&reference).unwrap();
        assert_eq!(codeword.as_bits(), &reference);
    }

    #[test]
    fn test_decode_corrects_noise() {
        let sketch = BchSketch::new(CodeConfig::DEFAULT).unwrap();
        let reference = pattern(255, 3);
        let (codeword, helper) = sketch.encode(&reference).unwrap();

        let mut noisy = reference.clone();
        for p in [2, 40, 41, 77, 128, 200, 254] {
            noisy.flip(p);
        }
        assert_eq!(sketch.decode(&noisy, &helper).unwrap(), codeword);
    }

    #[test]
    fn test_decode_rejects_mismatched_params() {
        let a = BchSketch::new(CodeConfig::new(8, 255, 16)).unwrap();
        let b = BchSketch::new(CodeConfig::new(8, 255, 8)).unwrap();
        let reference = pattern(255, 9);
        let (_, helper) = a.encode(&reference).unwrap();
        assert_eq!(
            b.decode(&reference, &helper).unwrap_err(),
            Error::HelperDataMismatch
        );
        let short = pattern(200, 9);
        assert_eq!(
            a.decode(&short, &helper).unwrap_err(),
            Error::ResponseLengthMismatch
        );
    }

    #[test]
    fn test_majority_vote() {
        let a = pattern(64, 1);
        let mut b = a.clone();
        let mut c = a.clone();
        b.flip(5);
        c.flip(9);
        let voted = majority_vote(&[a.clone(), b, c]).unwrap();
        assert_eq!(voted, a);

        assert_eq!(
            majority_vote(&[a.clone(), a.clone()]).unwrap_err(),
            Error::InvalidParameter
        );
        assert_eq!(majority_vote(&[]).unwrap_err(), Error::InvalidParameter);
        assert_eq!(
            majority_vote(&[a, pattern(63, 1), pattern(64, 2)]).unwrap_err(),
            Error::ResponseLengthMismatch
        );
    }
}

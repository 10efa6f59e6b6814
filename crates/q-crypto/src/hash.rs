// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hash function implementations
//!
//! SHA3-256, HMAC-SHA3-256 and HKDF-SHA3-256 over the `sha3` crate.

use crate::error::CryptoError;
use crate::traits::{Hash, Kdf};
use sha3::{Digest, Sha3_256 as Sha3_256Impl};
use zeroize::Zeroize;

/// SHA3-256 hash output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sha3_256Output([u8; 32]);

impl Sha3_256Output {
    /// Create from bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as an array
    #[must_use]
    pub const fn into_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Sha3_256Output {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha3_256Output {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// SHA3-256 hasher
pub struct Sha3_256 {
    inner: Sha3_256Impl,
}

impl Hash for Sha3_256 {
    type Output = Sha3_256Output;

    fn hash(message: &[u8]) -> Self::Output {
        let result = Sha3_256Impl::digest(message);
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Sha3_256Output(output)
    }

    fn new() -> Self {
        Self {
            inner: Sha3_256Impl::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self) -> Self::Output {
        let result = self.inner.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Sha3_256Output(output)
    }
}

impl Default for Sha3_256 {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a sequence of parts with SHA3-256
///
/// Parts are absorbed back to back; callers encode fixed-width fields so
/// the concatenation is unambiguous.
#[must_use]
pub fn sha3_256_parts(parts: &[&[u8]]) -> Sha3_256Output {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

// =============================================================================
// HMAC / HKDF
// =============================================================================

/// Longest `info` accepted by [`HkdfSha3_256::expand`]
pub const MAX_HKDF_INFO_LEN: usize = 256;

/// HMAC using SHA3-256
pub struct HmacSha3_256;

impl HmacSha3_256 {
    const BLOCK_SIZE: usize = 136;

    /// Compute HMAC-SHA3-256(key, data)
    #[must_use]
    pub fn mac(key: &[u8], data: &[u8]) -> Sha3_256Output {
        // Prepare key
        let mut key_block = [0u8; Self::BLOCK_SIZE];
        if key.len() > Self::BLOCK_SIZE {
            let hash = Sha3_256::hash(key);
            key_block[..32].copy_from_slice(hash.as_ref());
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }

        // Inner hash: H((K ^ ipad) || data)
        let mut pad = [0x36u8; Self::BLOCK_SIZE];
        for (p, k) in pad.iter_mut().zip(key_block.iter()) {
            *p ^= k;
        }

        let mut hasher = Sha3_256::new();
        hasher.update(&pad);
        hasher.update(data);
        let inner_hash = hasher.finalize();

        // Outer hash: H((K ^ opad) || inner_hash)
        pad = [0x5cu8; Self::BLOCK_SIZE];
        for (p, k) in pad.iter_mut().zip(key_block.iter()) {
            *p ^= k;
        }

        let mut hasher = Sha3_256::new();
        hasher.update(&pad);
        hasher.update(inner_hash.as_ref());

        pad.zeroize();
        key_block.zeroize();
        hasher.finalize()
    }
}

/// HKDF using SHA3-256
pub struct HkdfSha3_256;

impl HkdfSha3_256 {
    /// Extract: derive PRK from input key material and salt
    #[must_use]
    pub fn extract(salt: &[u8], ikm: &[u8]) -> Sha3_256Output {
        HmacSha3_256::mac(salt, ikm)
    }

    /// Expand: derive output key material from PRK
    ///
    /// Implements HKDF-Expand per RFC 5869 Section 2.3 using HMAC-SHA3-256:
    ///   T(1) = HMAC(PRK, info || 0x01)
    ///   T(n) = HMAC(PRK, T(n-1) || info || n)
    ///   OKM  = T(1) || T(2) || ... (truncated to output length)
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::BufferTooSmall` if output exceeds 255 * 32 bytes
    /// and `CryptoError::ContextTooLong` if `info` exceeds
    /// [`MAX_HKDF_INFO_LEN`].
    pub fn expand(prk: &[u8], info: &[u8], output: &mut [u8]) -> Result<(), CryptoError> {
        if output.len() > 255 * 32 {
            return Err(CryptoError::BufferTooSmall);
        }
        if info.len() > MAX_HKDF_INFO_LEN {
            return Err(CryptoError::ContextTooLong);
        }

        let mut t = [0u8; 32];
        let mut hmac_input = [0u8; 32 + MAX_HKDF_INFO_LEN + 1];
        let mut offset = 0;
        let mut counter = 1u8;

        while offset < output.len() {
            // T(0) is empty
            let mut input_len = 0;
            if counter > 1 {
                hmac_input[..32].copy_from_slice(&t);
                input_len += 32;
            }

            hmac_input[input_len..input_len + info.len()].copy_from_slice(info);
            input_len += info.len();

            hmac_input[input_len] = counter;
            input_len += 1;

            t.copy_from_slice(HmacSha3_256::mac(prk, &hmac_input[..input_len]).as_ref());

            let copy_len = (output.len() - offset).min(32);
            output[offset..offset + copy_len].copy_from_slice(&t[..copy_len]);
            offset += copy_len;
            counter = counter.wrapping_add(1);
        }

        t.zeroize();
        hmac_input.zeroize();
        Ok(())
    }

    /// Full HKDF (extract + expand)
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::BufferTooSmall` if output is too large.
    pub fn derive(
        ikm: &[u8],
        salt: &[u8],
        info: &[u8],
        output: &mut [u8],
    ) -> Result<(), CryptoError> {
        let mut prk = Self::extract(salt, ikm).into_bytes();
        let result = Self::expand(&prk, info, output);
        prk.zeroize();
        result
    }
}

impl Kdf for HkdfSha3_256 {
    fn derive(
        ikm: &[u8],
        salt: &[u8],
        info: &[u8],
        output: &mut [u8],
    ) -> Result<(), CryptoError> {
        HkdfSha3_256::derive(ikm, salt, info, output)
    }
}

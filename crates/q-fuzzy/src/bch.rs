// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Binary BCH syndrome decoder
//!
//! Narrow-sense binary BCH code of length `n <= 2^m - 1` and designed
//! correction radius `t`. Only the odd syndromes `S_1, S_3, ..., S_{2t-1}`
//! are independent over GF(2); even ones follow from `S_2i = S_i^2`.
//!
//! Decoding:
//! 1. Expand the odd error syndromes to `S_1..S_2t`
//! 2. Berlekamp-Massey for the error locator polynomial
//! 3. Chien search for error positions
//!
//! The decoder reports failure if the locator degree exceeds `t` or the
//! number of roots found in `0..n` differs from the degree.

use heapless::Vec;
use q_common::constants::MAX_CORRECTION_RADIUS;
use q_common::{CodeConfig, Error, ResponseBits, Result};

use crate::gf::{GaloisField, GfElement};

/// Maximum number of odd syndromes
pub const MAX_SYNDROMES: usize = MAX_CORRECTION_RADIUS as usize;

/// Capacity of locator polynomials (degree up to 2t during iteration)
const POLY_CAPACITY: usize = 2 * MAX_SYNDROMES + 2;

/// Odd syndromes `S_1, S_3, ..., S_{2t-1}`
pub type Syndromes = Vec<GfElement, MAX_SYNDROMES>;

/// Error positions located by the Chien search
pub type ErrorPositions = Vec<u16, MAX_SYNDROMES>;

/// Error locator polynomial `Lambda(x)` with its degree
struct ErrorLocator {
    coefficients: [GfElement; POLY_CAPACITY],
    degree: usize,
}

/// BCH decoder for one parameter set
pub struct BchDecoder {
    field: GaloisField,
    n: usize,
    t: usize,
}

impl BchDecoder {
    /// Create a decoder for the given code parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidCodeParameters` if the parameters fail validation.
    pub fn new(params: CodeConfig) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            field: GaloisField::new(params.field_degree)?,
            n: params.block_length as usize,
            t: params.correction_radius as usize,
        })
    }

    /// Block length in bits
    #[must_use]
    pub const fn block_length(&self) -> usize {
        self.n
    }

    /// Correction radius
    #[must_use]
    pub const fn correction_radius(&self) -> usize {
        self.t
    }

    /// Underlying field
    #[must_use]
    pub const fn field(&self) -> &GaloisField {
        &self.field
    }

    /// Compute the odd syndromes of `bits`
    ///
    /// `S_k = sum_j bits_j * alpha^(k*j)`. Every position contributes through
    /// a mask, so the work done does not depend on the bit values.
    ///
    /// # Errors
    ///
    /// Returns `ResponseLengthMismatch` if `bits` is not `n` bits long.
    pub fn odd_syndromes(&self, bits: &ResponseBits) -> Result<Syndromes> {
        if bits.len() != self.n {
            return Err(Error::ResponseLengthMismatch);
        }

        let order = self.field.order();
        let mut syndromes = Syndromes::new();
        for i in 0..self.t {
            let k = 2 * i + 1;
            let mut s: GfElement = 0;
            let mut power = 0usize;
            for j in 0..self.n {
                let mask = 0u16.wrapping_sub(u16::from(bits.bit(j)));
                s ^= self.field.alpha_pow(power) & mask;
                power += k;
                if power >= order {
                    power -= order;
                }
            }
            syndromes.push(s).map_err(|_| Error::InternalError)?;
        }
        Ok(syndromes)
    }

    /// Locate the error positions described by `error_syndromes`
    ///
    /// `error_syndromes` are the odd syndromes of the error pattern. Returns
    /// the positions to flip, or `CorrectionFailed` if the pattern is not
    /// within the correction radius.
    ///
    /// # Errors
    ///
    /// Returns `CorrectionFailed` when decoding fails and
    /// `HelperDataMismatch` for a wrong syndrome count.
    pub fn locate_errors(&self, error_syndromes: &[GfElement]) -> Result<ErrorPositions> {
        if error_syndromes.len() != self.t {
            return Err(Error::HelperDataMismatch);
        }

        let syndromes = self.expand_syndromes(error_syndromes);
        if syndromes[..2 * self.t].iter().all(|&s| s == 0) {
            return Ok(ErrorPositions::new());
        }

        let locator = self.berlekamp_massey(&syndromes);
        if locator.degree > self.t || locator.coefficients[locator.degree] == 0 {
            return Err(Error::CorrectionFailed);
        }

        self.chien_search(&locator)
    }

    /// `S_1..S_2t` (index 0 holds `S_1`) from the odd syndromes
    fn expand_syndromes(&self, odd: &[GfElement]) -> [GfElement; 2 * MAX_SYNDROMES] {
        let mut syndromes = [0 as GfElement; 2 * MAX_SYNDROMES];
        for k in 1..=2 * self.t {
            syndromes[k - 1] = if k % 2 == 1 {
                odd[(k - 1) / 2]
            } else {
                self.field.square(syndromes[k / 2 - 1])
            };
        }
        syndromes
    }

    /// Berlekamp-Massey over `S_1..S_2t`
    fn berlekamp_massey(&self, syndromes: &[GfElement]) -> ErrorLocator {
        // sigma(x) = 1, B(x) = 1
        let mut sigma = [0 as GfElement; POLY_CAPACITY];
        let mut b_poly = [0 as GfElement; POLY_CAPACITY];
        sigma[0] = 1;
        b_poly[0] = 1;

        let mut l = 0usize; // current degree of sigma
        let mut shift = 1usize; // steps since last length change
        let mut b_val: GfElement = 1;

        for r in 0..2 * self.t {
            // d = S_{r+1} + sum_{i=1..L} sigma_i * S_{r+1-i}
            let mut discrepancy = syndromes[r];
            for i in 1..=l.min(r) {
                discrepancy ^= self.field.mul(sigma[i], syndromes[r - i]);
            }

            if discrepancy == 0 {
                shift += 1;
                continue;
            }

            // T(x) = sigma(x) - d / b * x^shift * B(x)
            let mut next = sigma;
            let coeff = self.field.mul(discrepancy, self.field.inv(b_val));
            for i in 0..POLY_CAPACITY.saturating_sub(shift) {
                if b_poly[i] != 0 {
                    next[i + shift] ^= self.field.mul(coeff, b_poly[i]);
                }
            }

            if 2 * l <= r {
                b_poly = sigma;
                b_val = discrepancy;
                l = r + 1 - l;
                shift = 1;
            } else {
                shift += 1;
            }
            sigma = next;
        }

        ErrorLocator {
            coefficients: sigma,
            degree: l,
        }
    }

    /// Find the roots `alpha^-j` of the locator for `j` in `0..n`
    fn chien_search(&self, locator: &ErrorLocator) -> Result<ErrorPositions> {
        let order = self.field.order();
        let mut positions = ErrorPositions::new();

        for j in 0..self.n {
            // x = alpha^(-j)
            let x_log = (order - j % order) % order;
            let mut sum: GfElement = 0;
            for (i, &c) in locator.coefficients[..=locator.degree].iter().enumerate() {
                if c != 0 {
                    sum ^= self.field.mul(c, self.field.alpha_pow(x_log * i));
                }
            }
            if sum == 0 {
                positions
                    .push(j as u16)
                    .map_err(|_| Error::CorrectionFailed)?;
            }
        }

        if positions.len() == locator.degree {
            Ok(positions)
        } else {
            Err(Error::CorrectionFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(m: u8, n: u16, t: u8) -> BchDecoder {
        BchDecoder::new(CodeConfig::new(m, n, t)).unwrap()
    }

    fn syndromes_of_positions(dec: &BchDecoder, positions: &[usize]) -> Syndromes {
        let mut bits = ResponseBits::zeroed(dec.block_length()).unwrap();
        for &p in positions {
            bits.flip(p);
        }
        dec.odd_syndromes(&bits).unwrap()
    }

    #[test]
    fn test_bch_zero_syndromes_for_zero_word() {
        let dec = decoder(8, 255, 16);
        let bits = ResponseBits::zeroed(255).unwrap();
        let s = dec.odd_syndromes(&bits).unwrap();
        assert_eq!(s.len(), 16);
        assert!(s.iter().all(|&x| x == 0));
        assert!(dec.locate_errors(&s).unwrap().is_empty());
    }

    #[test]
    fn test_bch_single_error() {
        let dec = decoder(8, 255, 16);
        let s = syndromes_of_positions(&dec, &[100]);
        // S_1 = alpha^100 for a single error at position 100
        assert_eq!(s[0], dec.field().alpha_pow(100));
        assert_eq!(dec.locate_errors(&s).unwrap().as_slice(), &[100]);
    }

    #[test]
    fn test_bch_locates_t_errors() {
        let dec = decoder(8, 255, 16);
        let errors: [usize; 16] = [
            0, 3, 17, 31, 44, 59, 80, 99, 120, 141, 160, 181, 200, 222, 240, 254,
        ];
        let s = syndromes_of_positions(&dec, &errors);
        let found = dec.locate_errors(&s).unwrap();
        assert!(found.iter().map(|&p| p as usize).eq(errors.iter().copied()));
    }

    #[test]
    fn test_bch_shortened_code() {
        let dec = decoder(7, 100, 5);
        let s = syndromes_of_positions(&dec, &[0, 50, 99]);
        let found = dec.locate_errors(&s).unwrap();
        assert_eq!(found.as_slice(), &[0, 50, 99]);
    }

    #[test]
    fn test_bch_wrong_length_rejected() {
        let dec = decoder(8, 255, 16);
        let bits = ResponseBits::zeroed(254).unwrap();
        assert_eq!(
            dec.odd_syndromes(&bits).unwrap_err(),
            Error::ResponseLengthMismatch
        );
        assert_eq!(
            dec.locate_errors(&[0u16; 3]).unwrap_err(),
            Error::HelperDataMismatch
        );
    }

    #[test]
    fn test_bch_too_many_errors_not_located_as_is() {
        let dec = decoder(6, 63, 2);
        let errors = [1usize, 9, 20, 40, 62];
        let s = syndromes_of_positions(&dec, &errors);
        // Either a decoding failure or a miscorrection to some other word;
        // never the true five-error pattern.
        if let Ok(found) = dec.locate_errors(&s) {
            assert!(found.len() <= 2);
        }
    }
}

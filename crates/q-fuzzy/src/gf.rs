// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Arithmetic in GF(2^m)
//!
//! Elements are `u16` polynomials over GF(2) reduced by a fixed primitive
//! polynomial. Multiplication and inversion go through log/antilog tables
//! built once per field.

use q_common::constants::{MAX_FIELD_DEGREE, MIN_FIELD_DEGREE};
use q_common::{Error, Result};

/// Field element
pub type GfElement = u16;

/// Size of the largest supported field (2^10)
const MAX_FIELD_SIZE: usize = 1 << MAX_FIELD_DEGREE;

/// Primitive polynomial for degree `m`, including the `x^m` term
#[must_use]
pub const fn primitive_polynomial(m: u8) -> Option<u16> {
    match m {
        5 => Some(0x25),   // x^5 + x^2 + 1
        6 => Some(0x43),   // x^6 + x + 1
        7 => Some(0x89),   // x^7 + x^3 + 1
        8 => Some(0x11D),  // x^8 + x^4 + x^3 + x^2 + 1
        9 => Some(0x211),  // x^9 + x^4 + 1
        10 => Some(0x409), // x^10 + x^3 + 1
        _ => None,
    }
}

/// GF(2^m) with precomputed log/antilog tables
#[derive(Clone)]
pub struct GaloisField {
    m: u8,
    /// Number of non-zero elements, 2^m - 1
    order: usize,
    /// exp[i] = alpha^i, duplicated so exp[log a + log b] needs no reduction
    exp: [GfElement; 2 * MAX_FIELD_SIZE],
    /// log[alpha^i] = i; log[0] is unused
    log: [u16; MAX_FIELD_SIZE],
}

impl GaloisField {
    /// Build the tables for GF(2^m)
    ///
    /// # Errors
    ///
    /// Returns `InvalidCodeParameters` if `m` is outside the supported range.
    pub fn new(m: u8) -> Result<Self> {
        if !(MIN_FIELD_DEGREE..=MAX_FIELD_DEGREE).contains(&m) {
            return Err(Error::InvalidCodeParameters);
        }
        let poly = primitive_polynomial(m).ok_or(Error::InvalidCodeParameters)?;
        let size = 1usize << m;
        let order = size - 1;

        let mut field = Self {
            m,
            order,
            exp: [0; 2 * MAX_FIELD_SIZE],
            log: [0; MAX_FIELD_SIZE],
        };

        let mut val: u16 = 1;
        for i in 0..order {
            field.exp[i] = val;
            field.exp[i + order] = val;
            field.log[val as usize] = i as u16;

            // Multiply by alpha
            val <<= 1;
            if val as usize & size != 0 {
                val ^= poly;
            }
        }

        // alpha generates the whole group only if it returns to 1 after `order` steps
        if val != 1 {
            return Err(Error::InternalError);
        }
        Ok(field)
    }

    /// Field degree `m`
    #[must_use]
    pub const fn degree(&self) -> u8 {
        self.m
    }

    /// Multiplicative group order, 2^m - 1
    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    /// Multiply two elements
    #[inline]
    #[must_use]
    pub fn mul(&self, a: GfElement, b: GfElement) -> GfElement {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    /// Multiplicative inverse; `inv(0)` returns 0
    #[inline]
    #[must_use]
    pub fn inv(&self, a: GfElement) -> GfElement {
        if a == 0 {
            return 0;
        }
        self.exp[(self.order - self.log[a as usize] as usize) % self.order]
    }

    /// `a * a`
    #[inline]
    #[must_use]
    pub fn square(&self, a: GfElement) -> GfElement {
        self.mul(a, a)
    }

    /// `alpha^power`
    #[inline]
    #[must_use]
    pub fn alpha_pow(&self, power: usize) -> GfElement {
        self.exp[power % self.order]
    }
}

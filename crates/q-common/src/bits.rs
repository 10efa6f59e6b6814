// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Fixed-capacity bit vectors for PUF responses
//!
//! [`ResponseBits`] holds reference responses, noisy measurements and
//! reconstructed secrets. Bit `i` lives in byte `i / 8` at position `i % 8`
//! (LSB first). Bits beyond `len` are always zero. Contents are zeroized on
//! drop.

use core::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{MAX_RESPONSE_BITS, MAX_RESPONSE_BYTES};
use crate::errors::{Error, Result};

/// Fixed-capacity, zeroize-on-drop bit vector
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ResponseBits {
    bytes: [u8; MAX_RESPONSE_BYTES],
    len: usize,
}

impl ResponseBits {
    /// Create an all-zero vector of `len` bits
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `len` is zero or exceeds capacity.
    pub fn zeroed(len: usize) -> Result<Self> {
        if len == 0 || len > MAX_RESPONSE_BITS {
            return Err(Error::InvalidParameter);
        }
        Ok(Self {
            bytes: [0u8; MAX_RESPONSE_BYTES],
            len,
        })
    }

    /// Create from packed bytes, keeping the first `len` bits
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an unsupported length and
    /// `BufferTooSmall` if `bytes` holds fewer than `len` bits.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Result<Self> {
        let mut bits = Self::zeroed(len)?;
        let n = Self::byte_len_for(len);
        if bytes.len() < n {
            return Err(Error::BufferTooSmall);
        }
        bits.bytes[..n].copy_from_slice(&bytes[..n]);
        bits.clear_tail();
        Ok(bits)
    }

    /// Number of bytes needed for `len` bits
    #[must_use]
    pub const fn byte_len_for(len: usize) -> usize {
        (len + 7) / 8
    }

    /// Number of bits
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false; zero-length vectors cannot be constructed
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed bytes (`byte_len_for(len)` bytes)
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..Self::byte_len_for(self.len)]
    }

    /// Mutable packed bytes; trailing bits are cleared by [`Self::clear_tail`]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let n = Self::byte_len_for(self.len);
        &mut self.bytes[..n]
    }

    /// Zero the unused bits of the last byte
    pub fn clear_tail(&mut self) {
        let n = Self::byte_len_for(self.len);
        let rem = self.len % 8;
        if rem != 0 {
            self.bytes[n - 1] &= (1u8 << rem) - 1;
        }
        for b in &mut self.bytes[n..] {
            *b = 0;
        }
    }

    /// Get bit `i` as 0 or 1 (out of range reads as 0)
    #[must_use]
    pub fn bit(&self, i: usize) -> u8 {
        if i >= self.len {
            return 0;
        }
        (self.bytes[i / 8] >> (i % 8)) & 1
    }

    /// Set bit `i`
    pub fn set(&mut self, i: usize, value: bool) {
        if i >= self.len {
            return;
        }
        let mask = 1u8 << (i % 8);
        if value {
            self.bytes[i / 8] |= mask;
        } else {
            self.bytes[i / 8] &= !mask;
        }
    }

    /// Flip bit `i`
    pub fn flip(&mut self, i: usize) {
        if i < self.len {
            self.bytes[i / 8] ^= 1u8 << (i % 8);
        }
    }

    /// XOR `other` into `self`
    ///
    /// # Errors
    ///
    /// Returns `ResponseLengthMismatch` if the lengths differ.
    pub fn xor_assign(&mut self, other: &Self) -> Result<()> {
        if self.len != other.len {
            return Err(Error::ResponseLengthMismatch);
        }
        for (a, b) in self.bytes.iter_mut().zip(other.bytes.iter()) {
            *a ^= *b;
        }
        Ok(())
    }

    /// Number of set bits
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.as_bytes().iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Hamming distance to `other`
    ///
    /// # Errors
    ///
    /// Returns `ResponseLengthMismatch` if the lengths differ.
    pub fn hamming_distance(&self, other: &Self) -> Result<usize> {
        if self.len != other.len {
            return Err(Error::ResponseLengthMismatch);
        }
        Ok(self
            .as_bytes()
            .iter()
            .zip(other.as_bytes())
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum())
    }
}

impl PartialEq for ResponseBits {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ResponseBits {}

impl fmt::Debug for ResponseBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseBits({} bits, [REDACTED])", self.len)
    }
}

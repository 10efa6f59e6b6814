// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Capability traits
//!
//! The PUF key schedule is generic over [`Kdf`] and the verifier over
//! [`CryptoRng`]. A DRBG pulls its seed material through [`EntropySource`]. Both are chosen by type at construction; nothing switches
//! algorithms at run time.

use crate::error::CryptoError;

/// Incremental hash with a fixed-size digest
pub trait Hash: Sized {
    /// Digest type
    type Output: AsRef<[u8]> + Clone;

    /// Digest `message` in one call
    fn hash(message: &[u8]) -> Self::Output;

    /// Fresh hasher
    fn new() -> Self;

    /// Absorb `data`
    fn update(&mut self, data: &[u8]);

    /// Produce the digest
    fn finalize(self) -> Self::Output;
}

/// Source of unpredictable bytes for session nonces
pub trait CryptoRng {
    /// Fill `dest` with random bytes
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` if the source cannot deliver.
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), CryptoError>;
}

impl<R: CryptoRng + ?Sized> CryptoRng for &mut R {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        (**self).fill_bytes(dest)
    }
}

/// Raw entropy feeding a DRBG
pub trait EntropySource {
    /// Fill `dest` with fresh entropy
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` if the source cannot deliver.
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), CryptoError>;
}

impl<E: EntropySource + ?Sized> EntropySource for &mut E {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        (**self).fill_entropy(dest)
    }
}

/// Extract-then-expand key derivation
pub trait Kdf {
    /// Fill `output` with key material derived from `ikm`, bound to `salt`
    /// and `info`
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `output` is longer than the function can
    /// produce and `ContextTooLong` for an oversized `info`.
    fn derive(ikm: &[u8], salt: &[u8], info: &[u8], output: &mut [u8])
        -> Result<(), CryptoError>;
}

/// Constant-time equality of two byte strings
///
/// Lengths are public; only the contents are protected.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;

    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

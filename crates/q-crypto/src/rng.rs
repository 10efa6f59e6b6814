// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Random number generation for session nonces
//!
//! [`SimpleRng`] is a SHA3-256 counter-mode generator with no entropy input
//! beyond its seed and explicit [`SimpleRng::reseed`] calls. It suits host
//! tooling and simulations; deployed verifiers take nonces from
//! [`SystemRng`](crate::drbg::SystemRng). [`TestRng`] is a fixed-seed
//! generator for deterministic tests.

use crate::error::CryptoError;
use crate::hash::{sha3_256_parts, Sha3_256};
use crate::traits::{CryptoRng, Hash};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Domain separator for reseeding
const RESEED_DOMAIN: &[u8] = b"q-crypto/rng/reseed/v1";

/// Seeded RNG using SHA3-256 in counter mode
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SimpleRng {
    /// State (seed)
    state: [u8; 32],
    /// Counter
    counter: u64,
}

impl SimpleRng {
    /// Create from 32-byte seed
    #[must_use]
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            state: seed,
            counter: 0,
        }
    }

    /// Create with simple u64 seed (for testing)
    #[must_use]
    pub fn from_u64(seed: u64) -> Self {
        Self::new(Sha3_256::hash(&seed.to_le_bytes()).into_bytes())
    }

    /// Mix fresh entropy into the state
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` for empty entropy input.
    pub fn reseed(&mut self, entropy: &[u8]) -> Result<(), CryptoError> {
        if entropy.is_empty() {
            return Err(CryptoError::RngFailure);
        }
        let next = sha3_256_parts(&[RESEED_DOMAIN, &self.state, entropy]);
        self.state = next.into_bytes();
        self.counter = 0;
        Ok(())
    }
}

impl CryptoRng for SimpleRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        let mut offset = 0;
        while offset < dest.len() {
            self.counter = self.counter.wrapping_add(1);

            let mut hasher = Sha3_256::new();
            hasher.update(&self.state);
            hasher.update(&self.counter.to_le_bytes());
            let block = hasher.finalize();

            let copy_len = (dest.len() - offset).min(32);
            dest[offset..offset + copy_len].copy_from_slice(&block.as_ref()[..copy_len]);
            offset += copy_len;
        }
        Ok(())
    }
}

// =============================================================================
// Test RNG (Deterministic for testing only)
// =============================================================================

/// Test RNG for deterministic testing (NOT FOR PRODUCTION)
#[cfg(any(test, feature = "test-vectors"))]
pub struct TestRng {
    seed: [u8; 32],
    counter: u64,
}

#[cfg(any(test, feature = "test-vectors"))]
impl TestRng {
    /// Create a test RNG with a fixed seed
    #[must_use]
    pub const fn new(seed: [u8; 32]) -> Self {
        Self { seed, counter: 0 }
    }

    /// Create a test RNG from a simple seed value
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self::new(bytes)
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

#[cfg(any(test, feature = "test-vectors"))]
impl CryptoRng for TestRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        let mut offset = 0;
        while offset < dest.len() {
            self.counter = self.counter.wrapping_add(1);
            let block = sha3_256_parts(&[&self.seed, &self.counter.to_le_bytes()]);
            let copy_len = (dest.len() - offset).min(32);
            dest[offset..offset + copy_len].copy_from_slice(&block.as_ref()[..copy_len]);
            offset += copy_len;
        }
        Ok(())
    }
}

/// Draw a fixed-size random array
///
/// # Errors
///
/// Propagates RNG failure.
pub fn random_bytes<const N: usize>(rng: &mut impl CryptoRng) -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    rng.fill_bytes(&mut buf)?;
    Ok(buf)
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Verifier nonce randomness from the hardware entropy source
//!
//! Session nonces are the replay defence, so a deployed verifier draws them
//! from a [`SystemRng`] seeded and reseeded through [`RngInterface`].

use q_common::{Error, Result};
use q_crypto::{CryptoError, EntropySource, SystemRng};
use q_hal::RngInterface;

/// Personalization string binding the DRBG to nonce generation
const PERSONALIZATION: &[u8] = b"q-attest/verifier-nonce/v1";

/// [`EntropySource`] over a HAL entropy device
pub struct HalEntropy<H: RngInterface>(H);

impl<H: RngInterface> HalEntropy<H> {
    /// Wrap an entropy device
    pub const fn new(hw: H) -> Self {
        Self(hw)
    }

    /// Underlying device
    pub fn device(&self) -> &H {
        &self.0
    }

    /// Underlying device, mutably
    pub fn device_mut(&mut self) -> &mut H {
        &mut self.0
    }
}

impl<H: RngInterface> EntropySource for HalEntropy<H> {
    fn fill_entropy(&mut self, dest: &mut [u8]) -> core::result::Result<(), CryptoError> {
        self.0.fill_bytes(dest).map_err(|_| CryptoError::RngFailure)
    }
}

/// Nonce generator for [`AuthenticationVerifier`](crate::AuthenticationVerifier)
pub type NonceRng<H> = SystemRng<HalEntropy<H>>;

/// Bring up `hw` and seed a nonce generator from it
///
/// # Errors
///
/// Returns `RngFailure` if the device cannot start, cannot deliver seed
/// material or fails a health test.
pub fn nonce_rng<H: RngInterface>(mut hw: H) -> Result<NonceRng<H>> {
    if !hw.is_ready() {
        hw.init().map_err(Error::from)?;
    }
    SystemRng::new(HalEntropy::new(hw), PERSONALIZATION).map_err(Error::from)
}

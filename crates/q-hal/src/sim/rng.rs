// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Simulated hardware entropy source
//!
//! Emits a SHA3-256 counter stream keyed by a seed. Fault injection covers
//! the two failures a DRBG has to survive: a source that stops answering
//! and a source stuck on one value.

use sha3::{Digest, Sha3_256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{HalError, HalResult};
use crate::traits::RngInterface;

/// Seeded entropy source with fault injection
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SimulatedTrng {
    key: [u8; 32],
    counter: u64,
    #[zeroize(skip)]
    ready: bool,
    #[zeroize(skip)]
    failed: bool,
    #[zeroize(skip)]
    stuck: Option<u8>,
    #[zeroize(skip)]
    draws: u32,
}

impl SimulatedTrng {
    /// Create an uninitialized source from `seed`
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha3_256::digest(seed.to_le_bytes()));
        Self {
            key,
            counter: 0,
            ready: false,
            failed: false,
            stuck: None,
            draws: 0,
        }
    }

    /// Make subsequent draws fail (or succeed again)
    pub fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    /// Emit `value` for every byte (`None` restores normal output)
    pub fn set_stuck(&mut self, value: Option<u8>) {
        self.stuck = value;
    }

    /// Number of successful draws so far
    #[must_use]
    pub const fn draws(&self) -> u32 {
        self.draws
    }
}

impl RngInterface for SimulatedTrng {
    fn init(&mut self) -> HalResult<()> {
        self.ready = true;
        Ok(())
    }

    fn fill_bytes(&mut self, buffer: &mut [u8]) -> HalResult<()> {
        if !self.ready || self.failed {
            return Err(HalError::RngError);
        }
        if let Some(value) = self.stuck {
            buffer.fill(value);
        } else {
            for chunk in buffer.chunks_mut(32) {
                self.counter = self.counter.wrapping_add(1);
                let mut hasher = Sha3_256::new();
                hasher.update(self.key);
                hasher.update(self.counter.to_le_bytes());
                chunk.copy_from_slice(&hasher.finalize()[..chunk.len()]);
            }
        }
        self.draws = self.draws.saturating_add(1);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

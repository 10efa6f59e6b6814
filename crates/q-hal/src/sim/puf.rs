// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Simulated noisy PUF
//!
//! The reference response for a challenge is SHAKE256 of the device seed and
//! challenge, so two instances built from the same seed model the same
//! physical device. Each measurement applies fresh noise drawn from a
//! SHA3-256 counter stream according to the configured [`NoiseModel`].

use q_common::constants::MAX_RESPONSE_BITS;
use q_common::{ChallengeId, ResponseBits};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_256, Shake256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{HalError, HalResult};
use crate::traits::PufInterface;

const REFERENCE_DOMAIN: &[u8] = b"q-hal/sim-puf/reference/v1";
const NOISE_DOMAIN: &[u8] = b"q-hal/sim-puf/noise/v1";

/// Noise applied to each measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseModel {
    /// Every measurement equals the reference
    Noiseless,
    /// Exactly this many distinct bits flipped per measurement
    FixedWeight(u16),
    /// Each bit flips independently with probability `per_mille / 1000`
    BitErrorRate {
        /// Flip probability in thousandths
        per_mille: u16,
    },
}

/// Deterministic noise source
#[derive(Zeroize)]
struct NoiseStream {
    key: [u8; 32],
    counter: u64,
    block: [u8; 32],
    pos: usize,
}

impl NoiseStream {
    fn new(seed: &[u8; 32]) -> Self {
        let mut hasher = Sha3_256::new();
        Digest::update(&mut hasher, NOISE_DOMAIN);
        Digest::update(&mut hasher, seed);
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        Self {
            key,
            counter: 0,
            block: [0u8; 32],
            pos: 32,
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut out = [0u8; 4];
        for byte in &mut out {
            if self.pos == self.block.len() {
                self.counter = self.counter.wrapping_add(1);
                let mut hasher = Sha3_256::new();
                Digest::update(&mut hasher, self.key);
                Digest::update(&mut hasher, self.counter.to_le_bytes());
                self.block.copy_from_slice(&hasher.finalize());
                self.pos = 0;
            }
            *byte = self.block[self.pos];
            self.pos += 1;
        }
        u32::from_le_bytes(out)
    }
}

/// Simulated PUF device
#[derive(ZeroizeOnDrop)]
pub struct SimulatedPuf {
    seed: [u8; 32],
    #[zeroize(skip)]
    response_bits: usize,
    #[zeroize(skip)]
    noise: NoiseModel,
    stream: NoiseStream,
    #[zeroize(skip)]
    available: bool,
    #[zeroize(skip)]
    captures: u32,
}

impl SimulatedPuf {
    /// Create a noiseless simulated device
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an unsupported response length.
    pub fn new(seed: [u8; 32], response_bits: usize) -> HalResult<Self> {
        if response_bits == 0 || response_bits > MAX_RESPONSE_BITS {
            return Err(HalError::InvalidParameter);
        }
        Ok(Self {
            stream: NoiseStream::new(&seed),
            seed,
            response_bits,
            noise: NoiseModel::Noiseless,
            available: true,
            captures: 0,
        })
    }

    /// Builder-style noise selection
    #[must_use]
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }

    /// Change the noise model for subsequent measurements
    pub fn set_noise(&mut self, noise: NoiseModel) {
        self.noise = noise;
    }

    /// Current noise model
    #[must_use]
    pub const fn noise(&self) -> NoiseModel {
        self.noise
    }

    /// Simulate the PUF becoming unreadable (or readable again)
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Number of measurements taken so far
    #[must_use]
    pub const fn captures(&self) -> u32 {
        self.captures
    }

    /// Write the noise-free reference response for `challenge`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `out` has the wrong length.
    pub fn reference(&self, challenge: ChallengeId, out: &mut ResponseBits) -> HalResult<()> {
        if out.len() != self.response_bits {
            return Err(HalError::InvalidParameter);
        }
        let mut xof = Shake256::default();
        Update::update(&mut xof, REFERENCE_DOMAIN);
        Update::update(&mut xof, &self.seed);
        Update::update(&mut xof, &challenge.to_le_bytes());
        let mut reader = xof.finalize_xof();
        reader.read(out.as_bytes_mut());
        out.clear_tail();
        Ok(())
    }

    fn apply_noise(&mut self, response: &mut ResponseBits) -> HalResult<()> {
        let n = self.response_bits;
        match self.noise {
            NoiseModel::Noiseless => {}
            NoiseModel::FixedWeight(weight) => {
                let weight = usize::from(weight).min(n);
                let mut mask = ResponseBits::zeroed(n).map_err(|_| HalError::InvalidParameter)?;
                let mut placed = 0;
                while placed < weight {
                    let pos = self.stream.next_u32() as usize % n;
                    if mask.bit(pos) == 0 {
                        mask.set(pos, true);
                        placed += 1;
                    }
                }
                response
                    .xor_assign(&mask)
                    .map_err(|_| HalError::InvalidParameter)?;
            }
            NoiseModel::BitErrorRate { per_mille } => {
                for i in 0..n {
                    if self.stream.next_u32() % 1000 < u32::from(per_mille) {
                        response.flip(i);
                    }
                }
            }
        }
        Ok(())
    }
}

impl PufInterface for SimulatedPuf {
    fn response_bits(&self) -> usize {
        self.response_bits
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn measure(&mut self, challenge: ChallengeId, response: &mut ResponseBits) -> HalResult<()> {
        if !self.available {
            return Err(HalError::PufNotAvailable);
        }
        self.reference(challenge, response)?;
        self.apply_noise(response)?;
        self.captures = self.captures.saturating_add(1);
        Ok(())
    }
}

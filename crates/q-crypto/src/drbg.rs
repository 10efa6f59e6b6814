// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Nonce-grade randomness
//!
//! [`HashDrbg`] is the NIST SP 800-90A Hash_DRBG construction instantiated
//! with SHA3-256. [`SystemRng`] owns a DRBG together with an
//! [`EntropySource`]: every entropy draw passes the SP 800-90B continuous
//! health tests in [`EntropyHealthTest`] before it is used, and the DRBG is
//! reseeded from the source once its reseed interval is spent.
//!
//! Deployed verifiers draw session nonces from a [`SystemRng`] over the
//! platform entropy source. [`SimpleRng`](crate::rng::SimpleRng) has no
//! entropy input after construction and is meant for host tooling.

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::hash::{sha3_256_parts, Sha3_256};
use crate::traits::{CryptoRng, EntropySource, Hash};

/// Hash_DRBG seed length for a 256-bit hash (440 bits)
pub const SEED_LEN: usize = 55;

/// Entropy input per instantiate or reseed
pub const ENTROPY_LEN: usize = 32;

/// Instantiation nonce length
pub const DRBG_NONCE_LEN: usize = 16;

/// Largest single generate request
pub const MAX_REQUEST: usize = 1 << 16;

/// Generate requests allowed between reseeds
pub const RESEED_INTERVAL: u64 = 1 << 20;

// =============================================================================
// SP 800-90B continuous health tests
// =============================================================================

/// Repetition count cutoff for 8-bit samples at alpha = 2^-20
const REPETITION_CUTOFF: u16 = 4;

/// Adaptive proportion window
const ADAPTIVE_WINDOW: u16 = 512;

/// Adaptive proportion cutoff for 8-bit samples at alpha = 2^-20
const ADAPTIVE_CUTOFF: u16 = 13;

/// Continuous health tests over byte samples
///
/// A failure latches: the tests report unhealthy until [`reset`] is called
/// by whoever restores the source.
///
/// [`reset`]: EntropyHealthTest::reset
#[derive(Debug, Clone)]
pub struct EntropyHealthTest {
    last: Option<u8>,
    run: u16,
    window_sample: u8,
    window_hits: u16,
    window_pos: u16,
    failed: bool,
}

impl EntropyHealthTest {
    /// Fresh tests
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: None,
            run: 0,
            window_sample: 0,
            window_hits: 0,
            window_pos: 0,
            failed: false,
        }
    }

    /// Feed one sample
    fn sample(&mut self, sample: u8) -> bool {
        // repetition count
        if self.last == Some(sample) {
            self.run += 1;
            if self.run >= REPETITION_CUTOFF {
                return false;
            }
        } else {
            self.last = Some(sample);
            self.run = 1;
        }

        // adaptive proportion
        if self.window_pos == 0 {
            self.window_sample = sample;
            self.window_hits = 1;
        } else if sample == self.window_sample {
            self.window_hits += 1;
            if self.window_hits >= ADAPTIVE_CUTOFF {
                return false;
            }
        }
        self.window_pos = (self.window_pos + 1) % ADAPTIVE_WINDOW;
        true
    }

    /// Run the tests over `samples`
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` if a test trips now or tripped
    /// earlier.
    pub fn check(&mut self, samples: &[u8]) -> Result<(), CryptoError> {
        if self.failed {
            return Err(CryptoError::RngFailure);
        }
        if samples.iter().all(|&s| self.sample(s)) {
            Ok(())
        } else {
            self.failed = true;
            Err(CryptoError::RngFailure)
        }
    }

    /// Whether no test has tripped
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        !self.failed
    }

    /// Clear a latched failure and restart both tests
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for EntropyHealthTest {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Hash_DRBG
// =============================================================================

/// SHA3-256 Hash_DRBG state
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct HashDrbg {
    v: [u8; SEED_LEN],
    c: [u8; SEED_LEN],
    reseed_counter: u64,
}

impl HashDrbg {
    /// Instantiate from `entropy` (at least 32 bytes), `nonce` and an
    /// optional personalization string
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` for short entropy input.
    pub fn instantiate(
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        if entropy.len() < ENTROPY_LEN {
            return Err(CryptoError::RngFailure);
        }
        let mut drbg = Self {
            v: [0u8; SEED_LEN],
            c: [0u8; SEED_LEN],
            reseed_counter: 1,
        };
        hash_df(&[entropy, nonce, personalization], &mut drbg.v);
        drbg.derive_c();
        Ok(drbg)
    }

    /// Mix fresh `entropy` and optional `additional` input into the state
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` for short entropy input.
    pub fn reseed(&mut self, entropy: &[u8], additional: &[u8]) -> Result<(), CryptoError> {
        if entropy.len() < ENTROPY_LEN {
            return Err(CryptoError::RngFailure);
        }
        let v = Zeroizing::new(self.v);
        hash_df(&[&[0x01], v.as_slice(), entropy, additional], &mut self.v);
        self.derive_c();
        self.reseed_counter = 1;
        Ok(())
    }

    /// Produce `output`, optionally binding `additional` input
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` above [`MAX_REQUEST`] bytes and `RngFailure`
    /// once the reseed interval is exhausted.
    pub fn generate(&mut self, output: &mut [u8], additional: &[u8]) -> Result<(), CryptoError> {
        if output.len() > MAX_REQUEST {
            return Err(CryptoError::BufferTooSmall);
        }
        if self.needs_reseed() {
            return Err(CryptoError::RngFailure);
        }

        if !additional.is_empty() {
            let w = sha3_256_parts(&[&[0x02], &self.v, additional]);
            add_be(&mut self.v, w.as_ref());
        }

        let mut data = Zeroizing::new(self.v);
        for chunk in output.chunks_mut(32) {
            let block = Sha3_256::hash(data.as_slice());
            chunk.copy_from_slice(&block.as_ref()[..chunk.len()]);
            add_be(&mut data, &[1]);
        }

        let h = sha3_256_parts(&[&[0x03], &self.v]);
        add_be(&mut self.v, h.as_ref());
        add_be(&mut self.v, &self.c);
        add_be(&mut self.v, &self.reseed_counter.to_be_bytes());
        self.reseed_counter += 1;
        Ok(())
    }

    /// Whether the reseed interval is exhausted
    #[must_use]
    pub const fn needs_reseed(&self) -> bool {
        self.reseed_counter > RESEED_INTERVAL
    }

    /// Generate requests since the last (re)seed, plus one
    #[must_use]
    pub const fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    fn derive_c(&mut self) {
        hash_df(&[&[0x00], &self.v], &mut self.c);
    }
}

impl CryptoRng for HashDrbg {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        for chunk in dest.chunks_mut(MAX_REQUEST) {
            self.generate(chunk, &[])?;
        }
        Ok(())
    }
}

/// Hash_df over the concatenation of `parts`
fn hash_df(parts: &[&[u8]], output: &mut [u8; SEED_LEN]) {
    let bits = (SEED_LEN as u32 * 8).to_be_bytes();
    for (counter, chunk) in (1u8..).zip(output.chunks_mut(32)) {
        let mut hasher = Sha3_256::new();
        hasher.update(&[counter]);
        hasher.update(&bits);
        for part in parts {
            hasher.update(part);
        }
        chunk.copy_from_slice(&hasher.finalize().as_ref()[..chunk.len()]);
    }
}

/// `acc = (acc + addend) mod 2^(8 * SEED_LEN)`, both big-endian
fn add_be(acc: &mut [u8; SEED_LEN], addend: &[u8]) {
    let mut carry = 0u16;
    let mut addend = addend.iter().rev();
    for byte in acc.iter_mut().rev() {
        let sum = u16::from(*byte) + u16::from(addend.next().copied().unwrap_or(0)) + carry;
        *byte = sum as u8;
        carry = sum >> 8;
    }
}

// =============================================================================
// System RNG
// =============================================================================

/// Hash_DRBG seeded and reseeded from a health-tested entropy source
pub struct SystemRng<E: EntropySource> {
    drbg: HashDrbg,
    source: E,
    health: EntropyHealthTest,
    reseed_interval: u64,
    reseeds: u32,
}

impl<E: EntropySource> SystemRng<E> {
    /// Draw seed material from `source` and instantiate
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` if the source fails or its output
    /// trips a health test.
    pub fn new(mut source: E, personalization: &[u8]) -> Result<Self, CryptoError> {
        let mut health = EntropyHealthTest::new();
        let mut seed = Zeroizing::new([0u8; ENTROPY_LEN + DRBG_NONCE_LEN]);
        source.fill_entropy(seed.as_mut_slice())?;
        health.check(seed.as_slice())?;

        let (entropy, nonce) = seed.split_at(ENTROPY_LEN);
        let drbg = HashDrbg::instantiate(entropy, nonce, personalization)?;
        Ok(Self {
            drbg,
            source,
            health,
            reseed_interval: RESEED_INTERVAL,
            reseeds: 0,
        })
    }

    /// Reseed after `requests` generate calls instead of [`RESEED_INTERVAL`]
    #[must_use]
    pub fn with_reseed_interval(mut self, requests: u64) -> Self {
        self.reseed_interval = requests.clamp(1, RESEED_INTERVAL);
        self
    }

    /// Pull fresh entropy from the source into the DRBG
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngFailure` if the source fails or its output
    /// trips a health test.
    pub fn reseed(&mut self) -> Result<(), CryptoError> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
        self.source.fill_entropy(entropy.as_mut_slice())?;
        self.health.check(entropy.as_slice())?;
        self.drbg.reseed(entropy.as_slice(), &[])?;
        self.reseeds = self.reseeds.saturating_add(1);
        Ok(())
    }

    /// Whether the entropy source has passed every health test
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    /// Reseeds performed since instantiation
    #[must_use]
    pub const fn reseeds(&self) -> u32 {
        self.reseeds
    }

    /// Entropy source
    pub fn source(&self) -> &E {
        &self.source
    }

    /// Entropy source, mutably
    pub fn source_mut(&mut self) -> &mut E {
        &mut self.source
    }
}

impl<E: EntropySource> CryptoRng for SystemRng<E> {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), CryptoError> {
        if !self.health.is_healthy() {
            return Err(CryptoError::RngFailure);
        }
        for chunk in dest.chunks_mut(MAX_REQUEST) {
            if self.drbg.reseed_counter() > self.reseed_interval {
                self.reseed()?;
            }
            self.drbg.generate(chunk, &[])?;
        }
        Ok(())
    }
}

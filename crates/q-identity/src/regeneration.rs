// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Device-side regeneration
//!
//! Rebuilds the enrollment key from a fresh measurement and the helper data,
//! then answers a session nonce with a proof. Each attempt measures anew;
//! correction failures are retried within a bounded [`RetryBudget`].

use core::marker::PhantomData;

use q_common::{
    ChallengeId, DeviceId, Error, Proof, RegenerationConfig, ResponseBits, Result, SessionNonce,
};
use q_crypto::{HkdfSha3_256, Kdf, PufKdf};
use q_fuzzy::{ErrorCorrectingCode, HelperData};
use q_hal::PufInterface;

/// Bounded number of regeneration attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u8,
    used: u8,
}

impl RetryBudget {
    /// Budget of `max` attempts
    #[must_use]
    pub const fn new(max: u8) -> Self {
        Self { max, used: 0 }
    }

    /// Take one attempt from the budget; `false` once exhausted
    pub fn try_consume(&mut self) -> bool {
        if self.used < self.max {
            self.used += 1;
            true
        } else {
            false
        }
    }

    /// Attempts taken so far
    #[must_use]
    pub const fn used(&self) -> u8 {
        self.used
    }

    /// Attempts left
    #[must_use]
    pub const fn remaining(&self) -> u8 {
        self.max - self.used
    }

    /// Whether no attempts are left
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}

/// Device-side regenerator over a PUF source `P`, code `E` and KDF `K`
pub struct DeviceRegenerator<P, E, K = HkdfSha3_256> {
    device_id: DeviceId,
    puf: P,
    ecc: E,
    config: RegenerationConfig,
    last_attempts: u8,
    _kdf: PhantomData<K>,
}

impl<P, E, K> DeviceRegenerator<P, E, K>
where
    P: PufInterface,
    E: ErrorCorrectingCode,
    K: Kdf,
{
    /// Create a regenerator for `device_id`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an invalid configuration and
    /// `ResponseLengthMismatch` if the PUF response length differs from the
    /// code block length.
    pub fn new(device_id: DeviceId, puf: P, ecc: E, config: RegenerationConfig) -> Result<Self> {
        config.validate()?;
        if puf.response_bits() != ecc.params().block_length as usize {
            return Err(Error::ResponseLengthMismatch);
        }
        Ok(Self {
            device_id,
            puf,
            ecc,
            config,
            last_attempts: 0,
            _kdf: PhantomData,
        })
    }

    /// Single attempt: measure, correct, derive, prove
    ///
    /// # Errors
    ///
    /// Returns `CorrectionFailed` if the measurement is too noisy, and
    /// propagates PUF, code and KDF errors.
    pub fn regenerate_once(
        &mut self,
        challenge: ChallengeId,
        helper: &HelperData,
        nonce: &SessionNonce,
    ) -> Result<Proof> {
        let mut noisy = ResponseBits::zeroed(self.puf.response_bits())?;
        self.puf.measure(challenge, &mut noisy)?;

        let codeword = self.ecc.decode(&noisy, helper)?;
        drop(noisy);

        let key = PufKdf::<K>::derive_key(codeword.as_bytes(), &self.device_id, challenge)?;
        drop(codeword);

        Ok(PufKdf::<K>::device_proof(
            &key,
            &self.device_id,
            challenge,
            nonce,
        )?)
    }

    /// Regenerate with bounded retry
    ///
    /// Retries on `CorrectionFailed` with a fresh measurement until the
    /// budget of `max_attempts` is spent.
    ///
    /// # Errors
    ///
    /// Returns `RegenerationFailed` once the budget is exhausted; any error
    /// other than `CorrectionFailed` aborts immediately.
    pub fn regenerate(
        &mut self,
        challenge: ChallengeId,
        helper: &HelperData,
        nonce: &SessionNonce,
    ) -> Result<Proof> {
        let mut budget = RetryBudget::new(self.config.max_attempts);
        let result = loop {
            if !budget.try_consume() {
                break Err(Error::RegenerationFailed);
            }
            match self.regenerate_once(challenge, helper, nonce) {
                Err(Error::CorrectionFailed) => continue,
                other => break other,
            }
        };
        self.last_attempts = budget.used();
        result
    }

    /// Attempts used by the most recent [`DeviceRegenerator::regenerate`]
    #[must_use]
    pub const fn last_attempts(&self) -> u8 {
        self.last_attempts
    }

    /// Device this regenerator proves for
    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Regeneration configuration
    #[must_use]
    pub const fn config(&self) -> &RegenerationConfig {
        &self.config
    }

    /// PUF source
    pub fn puf(&self) -> &P {
        &self.puf
    }

    /// Mutable PUF source
    pub fn puf_mut(&mut self) -> &mut P {
        &mut self.puf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget() {
        let mut budget = RetryBudget::new(2);
        assert_eq!(budget.remaining(), 2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert!(budget.is_exhausted());
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn test_empty_budget() {
        let mut budget = RetryBudget::new(0);
        assert!(budget.is_exhausted());
        assert!(!budget.try_consume());
    }
}

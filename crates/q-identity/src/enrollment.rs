// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Enrollment
//!
//! One-time capture of a reference response per `(device, challenge)`,
//! producing public helper data and a key commitment:
//!
//! ```text
//! PUF ──captures──► majority vote ──► ECC.encode ──► codeword, helper
//!                                                        │
//!                                   KDF(codeword) ──► key ──► commit(key)
//! ```
//!
//! The reference, codeword and key live in zeroize-on-drop buffers and are
//! wiped on every return path, including errors.

use core::marker::PhantomData;

use heapless::Vec;
use q_common::constants::MAX_REFERENCE_CAPTURES;
use q_common::{
    log_info, log_warn, ChallengeId, DeviceId, EnrollmentConfig, Error, EventCategory, LogBuffer,
    OverwritePolicy, ResponseBits, Result, Timestamp,
};
use q_crypto::{HkdfSha3_256, Kdf, PufKdf};
use q_fuzzy::{majority_vote, ErrorCorrectingCode};
use q_hal::PufInterface;

use crate::record::EnrollmentRecord;
use crate::storage::ChallengeResponseStore;

const MODULE: &str = "enroll";

/// Enrollment engine over a PUF source `P`, code `E` and KDF `K`
pub struct EnrollmentEngine<P, E, K = HkdfSha3_256> {
    puf: P,
    ecc: E,
    config: EnrollmentConfig,
    log: LogBuffer,
    _kdf: PhantomData<K>,
}

impl<P, E, K> EnrollmentEngine<P, E, K>
where
    P: PufInterface,
    E: ErrorCorrectingCode,
    K: Kdf,
{
    /// Create an engine
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an invalid configuration and
    /// `ResponseLengthMismatch` if the PUF response length differs from the
    /// code block length.
    pub fn new(puf: P, ecc: E, config: EnrollmentConfig) -> Result<Self> {
        config.validate()?;
        ecc.params().validate()?;
        if puf.response_bits() != ecc.params().block_length as usize {
            return Err(Error::ResponseLengthMismatch);
        }
        Ok(Self {
            puf,
            ecc,
            config,
            log: LogBuffer::new(),
            _kdf: PhantomData,
        })
    }

    /// Enroll `(device, challenge)` with the configured overwrite policy
    ///
    /// # Errors
    ///
    /// See [`EnrollmentEngine::enroll_with_policy`].
    pub fn enroll<S: ChallengeResponseStore + ?Sized>(
        &mut self,
        store: &mut S,
        device: DeviceId,
        challenge: ChallengeId,
        now: Timestamp,
    ) -> Result<EnrollmentRecord> {
        let policy = self.config.overwrite;
        self.enroll_with_policy(store, device, challenge, now, policy)
    }

    /// Enroll `(device, challenge)` with an explicit overwrite policy
    ///
    /// The duplicate check happens before the PUF is measured. On success the
    /// stored record is returned.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateChallenge` if a record exists under
    /// [`OverwritePolicy::Reject`], `PufNotAvailable`/`PufError` for
    /// measurement failures, and propagates code, KDF and store errors.
    pub fn enroll_with_policy<S: ChallengeResponseStore + ?Sized>(
        &mut self,
        store: &mut S,
        device: DeviceId,
        challenge: ChallengeId,
        now: Timestamp,
        policy: OverwritePolicy,
    ) -> Result<EnrollmentRecord> {
        let ts = now.as_secs().saturating_mul(1000);

        if policy == OverwritePolicy::Reject && store.contains(&device, challenge)? {
            log_warn!(
                self.log,
                ts,
                EventCategory::Lifecycle,
                MODULE,
                "duplicate enrollment {} {}",
                device,
                challenge
            );
            return Err(Error::DuplicateChallenge);
        }

        let reference = self.capture_reference(challenge)?;
        let (codeword, helper_data) = self.ecc.encode(&reference)?;
        drop(reference);

        let key = PufKdf::<K>::derive_key(codeword.as_bytes(), &device, challenge)?;
        drop(codeword);
        let commitment = PufKdf::<K>::commit(&key);
        drop(key);

        let record = EnrollmentRecord {
            device_id: device,
            challenge_id: challenge,
            helper_data,
            commitment,
            enrolled_at: now,
        };
        store.put(record.clone(), policy)?;

        log_info!(
            self.log,
            ts,
            EventCategory::Lifecycle,
            MODULE,
            "enrolled {} {}",
            device,
            challenge
        );
        Ok(record)
    }

    /// Measure the reference response, majority-voting multiple captures
    fn capture_reference(&mut self, challenge: ChallengeId) -> Result<ResponseBits> {
        let bits = self.puf.response_bits();
        let captures = usize::from(self.config.reference_captures);

        if captures == 1 {
            let mut reference = ResponseBits::zeroed(bits)?;
            self.puf.measure(challenge, &mut reference)?;
            return Ok(reference);
        }

        let mut samples: Vec<ResponseBits, { MAX_REFERENCE_CAPTURES as usize }> = Vec::new();
        for _ in 0..captures {
            let mut sample = ResponseBits::zeroed(bits)?;
            self.puf.measure(challenge, &mut sample)?;
            samples.push(sample).map_err(|_| Error::InvalidParameter)?;
        }
        majority_vote(&samples)
    }

    /// Enrollment configuration
    #[must_use]
    pub const fn config(&self) -> &EnrollmentConfig {
        &self.config
    }

    /// Event log
    #[must_use]
    pub const fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Mutable event log
    pub fn log_mut(&mut self) -> &mut LogBuffer {
        &mut self.log
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
    use crate::storage::MemoryStore;
    use q_common::CodeConfig;
    use q_fuzzy::BchSketch;
    use q_hal::sim::{NoiseModel, SimulatedPuf};

    const PARAMS: CodeConfig = CodeConfig::new(7, 127, 8);

    fn engine(noise: NoiseModel, captures: u8) -> EnrollmentEngine<SimulatedPuf, BchSketch> {
        let puf = SimulatedPuf::new([0x77; 32], 127).unwrap().with_noise(noise);
        let config = EnrollmentConfig {
            reference_captures: captures,
            overwrite: OverwritePolicy::Reject,
        };
        EnrollmentEngine::new(puf, BchSketch::new(PARAMS).unwrap(), config).unwrap()
    }

    #[test]
    fn test_enroll_stores_record() {
        let mut engine = engine(NoiseModel::Noiseless, 1);
        let mut store = MemoryStore::<4>::new();
        let dev = DeviceId::new([1; 32]);
        let record = engine
            .enroll(&mut store, dev, ChallengeId::new(5), Timestamp::new(10))
            .unwrap();
        assert_eq!(store.get(&dev, ChallengeId::new(5)).unwrap(), record);
        assert_eq!(record.helper_data.params(), PARAMS);
        assert_eq!(engine.log().count_category(EventCategory::Lifecycle), 1);
    }

    #[test]
    fn test_duplicate_checked_before_measuring() {
        let mut engine = engine(NoiseModel::Noiseless, 1);
        let mut store = MemoryStore::<4>::new();
        let dev = DeviceId::new([1; 32]);
        engine
            .enroll(&mut store, dev, ChallengeId::new(5), Timestamp::new(10))
            .unwrap();
        let captures = engine.puf().captures();

        assert_eq!(
            engine
                .enroll(&mut store, dev, ChallengeId::new(5), Timestamp::new(11))
                .unwrap_err(),
            Error::DuplicateChallenge
        );
        assert_eq!(engine.puf().captures(), captures);
    }

    #[test]
    fn test_majority_vote_uses_all_captures() {
        let mut engine = engine(NoiseModel::FixedWeight(3), 5);
        let mut store = MemoryStore::<4>::new();
        engine
            .enroll(
                &mut store,
                DeviceId::new([1; 32]),
                ChallengeId::new(1),
                Timestamp::new(0),
            )
            .unwrap();
        assert_eq!(engine.puf().captures(), 5);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let puf = SimulatedPuf::new([0; 32], 100).unwrap();
        let result = EnrollmentEngine::<_, _, HkdfSha3_256>::new(
            puf,
            BchSketch::new(PARAMS).unwrap(),
            EnrollmentConfig::DEFAULT,
        );
        assert_eq!(result.err(), Some(Error::ResponseLengthMismatch));
    }

    #[test]
    fn test_unavailable_puf() {
        let mut engine = engine(NoiseModel::Noiseless, 1);
        engine.puf_mut().set_available(false);
        let mut store = MemoryStore::<4>::new();
        assert_eq!(
            engine
                .enroll(
                    &mut store,
                    DeviceId::new([1; 32]),
                    ChallengeId::new(1),
                    Timestamp::new(0)
                )
                .unwrap_err(),
            Error::PufNotAvailable
        );
        assert!(store.is_empty());
    }
}

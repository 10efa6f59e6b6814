// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for q-attest
//!
//! Full sessions between an [`AuthenticationVerifier`] and an
//! [`AuthenticationResponder`] over simulated PUFs: acceptance under noise,
//! regeneration failure, replay, timeouts, rate limiting, capacity, store
//! faults, hardware-seeded nonces and the wire codecs.

use q_attest::{
    nonce_rng, AuthDecision, AuthResult, AuthenticationResponder, AuthenticationVerifier,
    ChallengeRequest, NonceRng, ProofResponse, ProofStatus, RejectReason, SessionState,
};
use q_common::{
    ChallengeId, CodeConfig, DeviceId, EnrollmentConfig, Error, EventCategory, Millis, Proof,
    ProtocolConfig, RegenerationConfig, Ticks, Timestamp,
};
use q_crypto::TestRng;
use q_fuzzy::BchSketch;
use q_hal::sim::{MemorySecureStorage, NoiseModel, SimulatedPuf, SimulatedTrng};
use q_hal::SecureStorageInterface;
use q_identity::{ChallengeResponseStore, DeviceRegenerator, EnrollmentEngine, MemoryStore, SlotStore};

const PARAMS: CodeConfig = CodeConfig::DEFAULT;
const T: u16 = 16;
const CHALLENGE: ChallengeId = ChallengeId::new(7);

type Store = MemoryStore<16>;
type Verifier = AuthenticationVerifier<TestRng>;
type Responder = AuthenticationResponder<SimulatedPuf, BchSketch>;

fn device(n: u8) -> DeviceId {
    DeviceId::new([n; 32])
}

fn sim_puf(n: u8, noise: NoiseModel) -> SimulatedPuf {
    SimulatedPuf::new([n.wrapping_mul(31).wrapping_add(5); 32], PARAMS.block_length as usize)
        .unwrap()
        .with_noise(noise)
}

fn sketch() -> BchSketch {
    BchSketch::new(PARAMS).unwrap()
}

fn enroll<S: ChallengeResponseStore>(store: &mut S, n: u8) {
    let mut engine: EnrollmentEngine<_, _> =
        EnrollmentEngine::new(sim_puf(n, NoiseModel::Noiseless), sketch(), EnrollmentConfig::DEFAULT)
            .unwrap();
    engine
        .enroll(store, device(n), CHALLENGE, Timestamp::new(1_700_000_000))
        .unwrap();
}

fn responder(n: u8, noise: NoiseModel) -> Responder {
    let regenerator = DeviceRegenerator::new(
        device(n),
        sim_puf(n, noise),
        sketch(),
        RegenerationConfig::DEFAULT,
    )
    .unwrap();
    AuthenticationResponder::new(regenerator)
}

fn verifier(config: ProtocolConfig) -> Verifier {
    AuthenticationVerifier::new(TestRng::from_seed(0x5EED), config).unwrap()
}

/// Issue, send and answer one session
fn run(
    store: &Store,
    verifier: &mut Verifier,
    responder: &mut Responder,
    now: Ticks,
) -> (ChallengeRequest, ProofResponse, AuthDecision) {
    let request = verifier.issue(store, device(1), CHALLENGE, now).unwrap();
    verifier.mark_sent(&request.nonce, now).unwrap();
    let response = responder.respond(&request, now).unwrap();
    let decision = verifier.handle_proof(store, &response, now + 1);
    (request, response, decision)
}

mod session_tests {
    use super::*;

    #[test]
    fn test_noisy_device_accepted() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::FixedWeight(T - 1));

        let (request, response, decision) =
            run(&store, &mut verifier, &mut device_side, Ticks::new(100));
        assert_eq!(response.status, ProofStatus::Proof);
        assert_eq!(decision, AuthDecision::Accepted);
        assert_eq!(
            verifier.session_state(&request.nonce),
            Some(SessionState::Accepted)
        );
        assert!(decision.to_result(request.nonce).accepted);
        assert_eq!(verifier.active_sessions(), 0);
    }

    #[test]
    fn test_regeneration_failure_rejected() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::FixedWeight(T + 5));

        let (request, response, decision) =
            run(&store, &mut verifier, &mut device_side, Ticks::new(0));
        assert_eq!(response.status, ProofStatus::RegenerationFailed);
        assert_eq!(response.proof, Proof::default());
        assert_eq!(device_side.regenerator().last_attempts(), 3);
        assert_eq!(
            decision,
            AuthDecision::Rejected(RejectReason::RegenerationFailed)
        );
        assert_eq!(
            verifier.session_state(&request.nonce),
            Some(SessionState::Rejected)
        );
        // device-side failure is not a mismatch
        assert_eq!(
            verifier.limiter_mut().remaining(&device(1), Ticks::new(0)),
            u32::from(ProtocolConfig::DEFAULT.mismatch_burst)
        );
    }

    #[test]
    fn test_replay_rejected() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::FixedWeight(3));

        let (first, first_response, decision) =
            run(&store, &mut verifier, &mut device_side, Ticks::new(0));
        assert!(decision.is_accepted());

        // same message again
        assert_eq!(
            verifier.handle_proof(&store, &first_response, Ticks::new(2)),
            AuthDecision::Rejected(RejectReason::StaleNonce)
        );
        assert_eq!(
            verifier.session_state(&first.nonce),
            Some(SessionState::Accepted)
        );

        // old proof under a new nonce
        let second = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(10))
            .unwrap();
        assert_ne!(first.nonce, second.nonce);
        verifier.mark_sent(&second.nonce, Ticks::new(10)).unwrap();
        let replay = ProofResponse::with_proof(second.nonce, first_response.proof);
        assert_eq!(
            verifier.handle_proof(&store, &replay, Ticks::new(11)),
            AuthDecision::Rejected(RejectReason::Mismatch)
        );
    }

    #[test]
    fn test_late_proof_times_out() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::Noiseless);

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        verifier.mark_sent(&request.nonce, Ticks::new(1)).unwrap();
        let response = device_side.respond(&request, Ticks::new(2)).unwrap();

        let deadline = Ticks::new(0) + ProtocolConfig::DEFAULT.session_timeout;
        assert_eq!(
            verifier.handle_proof(&store, &response, deadline),
            AuthDecision::Rejected(RejectReason::TimedOut)
        );
        assert_eq!(
            verifier.session_state(&request.nonce),
            Some(SessionState::TimedOut)
        );
        assert_eq!(
            verifier.handle_proof(&store, &response, deadline + 1),
            AuthDecision::Rejected(RejectReason::StaleNonce)
        );
        assert_eq!(verifier.log().count_category(EventCategory::Availability), 1);
    }

    #[test]
    fn test_poll_times_out_unsent_challenge() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        assert_eq!(verifier.poll_timeouts(Ticks::new(4_999)), 0);
        assert_eq!(verifier.poll_timeouts(Ticks::new(5_000)), 1);
        assert_eq!(
            verifier.mark_sent(&request.nonce, Ticks::new(5_001)),
            Err(Error::InvalidState)
        );
        // device free for a new session
        assert!(verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(5_002))
            .is_ok());
    }

    #[test]
    fn test_proof_before_send_is_out_of_order() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::Noiseless);

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        let response = device_side.respond(&request, Ticks::new(0)).unwrap();
        assert_eq!(
            verifier.handle_proof(&store, &response, Ticks::new(1)),
            AuthDecision::Rejected(RejectReason::OutOfOrder)
        );
        assert_eq!(
            verifier.session_state(&request.nonce),
            Some(SessionState::ChallengeIssued)
        );
        verifier.mark_sent(&request.nonce, Ticks::new(2)).unwrap();
        assert!(verifier
            .handle_proof(&store, &response, Ticks::new(3))
            .is_accepted());
    }

    #[test]
    fn test_foreign_device_and_impostor() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        enroll(&mut store, 2);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        let mut other = responder(2, NoiseModel::Noiseless);
        assert_eq!(
            other.respond(&request, Ticks::new(0)),
            Err(Error::DeviceMismatch)
        );

        // device 2 hardware claiming device 1's identity
        let regenerator = DeviceRegenerator::new(
            device(1),
            sim_puf(2, NoiseModel::Noiseless),
            sketch(),
            RegenerationConfig::DEFAULT,
        )
        .unwrap();
        let mut impostor: Responder = AuthenticationResponder::new(regenerator);
        verifier.mark_sent(&request.nonce, Ticks::new(1)).unwrap();
        let response = impostor.respond(&request, Ticks::new(1)).unwrap();
        assert_eq!(response.status, ProofStatus::RegenerationFailed);
        assert!(!verifier
            .handle_proof(&store, &response, Ticks::new(2))
            .is_accepted());
    }
}

mod policy_tests {
    use super::*;

    fn forged(verifier: &mut Verifier, store: &Store, n: u8, now: Ticks) -> AuthDecision {
        let request = verifier.issue(store, device(n), CHALLENGE, now).unwrap();
        verifier.mark_sent(&request.nonce, now).unwrap();
        let response = ProofResponse::with_proof(request.nonce, Proof::new([0x5A; 32]));
        verifier.handle_proof(store, &response, now + 1)
    }

    #[test]
    fn test_mismatches_rate_limited() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        enroll(&mut store, 2);
        let mut verifier = verifier(ProtocolConfig {
            mismatch_burst: 2,
            mismatch_refill: Millis::from_secs(30),
            ..ProtocolConfig::DEFAULT
        });

        for i in 0..2 {
            assert_eq!(
                forged(&mut verifier, &store, 1, Ticks::new(i * 10)),
                AuthDecision::Rejected(RejectReason::Mismatch)
            );
        }
        assert_eq!(
            verifier
                .issue(&store, device(1), CHALLENGE, Ticks::new(100))
                .unwrap_err(),
            Error::RateLimited
        );
        // other devices unaffected
        assert!(verifier
            .issue(&store, device(2), CHALLENGE, Ticks::new(100))
            .is_ok());
        // one mismatch forgiven per refill interval
        assert!(verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(31_000))
            .is_ok());
        assert!(verifier.log().count_category(EventCategory::Security) >= 3);
    }

    #[test]
    fn test_one_session_per_device() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        assert_eq!(
            verifier
                .issue(&store, device(1), CHALLENGE, Ticks::new(1))
                .unwrap_err(),
            Error::SessionInFlight
        );
    }

    #[test]
    fn test_session_table_capacity() {
        let mut store = Store::new();
        for n in 1..=3 {
            enroll(&mut store, n);
        }
        let mut verifier = verifier(ProtocolConfig {
            max_sessions: 2,
            ..ProtocolConfig::DEFAULT
        });
        let mut device_side = responder(1, NoiseModel::Noiseless);

        let first = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        verifier
            .issue(&store, device(2), CHALLENGE, Ticks::new(0))
            .unwrap();
        assert_eq!(
            verifier
                .issue(&store, device(3), CHALLENGE, Ticks::new(0))
                .unwrap_err(),
            Error::SessionTableFull
        );

        verifier.mark_sent(&first.nonce, Ticks::new(1)).unwrap();
        let response = device_side.respond(&first, Ticks::new(1)).unwrap();
        assert!(verifier
            .handle_proof(&store, &response, Ticks::new(2))
            .is_accepted());

        // the settled session is reclaimed
        assert!(verifier
            .issue(&store, device(3), CHALLENGE, Ticks::new(3))
            .is_ok());
        assert_eq!(verifier.tracked_sessions(), 2);
        assert_eq!(verifier.session_state(&first.nonce), None);
    }
}

mod store_tests {
    use super::*;

    type Slots = SlotStore<MemorySecureStorage<4, 256>>;

    fn answer<S: ChallengeResponseStore>(
        store: &S,
        verifier: &mut Verifier,
        device_side: &mut Responder,
        now: Ticks,
    ) -> (ChallengeRequest, AuthDecision) {
        let request = verifier.issue(store, device(1), CHALLENGE, now).unwrap();
        verifier.mark_sent(&request.nonce, now).unwrap();
        let response = device_side.respond(&request, now).unwrap();
        (request, verifier.handle_proof(store, &response, now + 1))
    }

    #[test]
    fn test_damaged_slot_does_not_block_other_devices() {
        let mut storage = MemorySecureStorage::<4, 256>::new();
        storage.write(0, &[0xEE; 40]).unwrap();
        let mut store: Slots = SlotStore::new(storage);
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::FixedWeight(2));

        let (_, decision) = answer(&store, &mut verifier, &mut device_side, Ticks::new(0));
        assert_eq!(decision, AuthDecision::Accepted);
        assert!(store.log().count_category(EventCategory::Availability) > 0);
    }

    #[test]
    fn test_damaged_record_is_a_verifier_fault() {
        let mut store: Slots = SlotStore::new(MemorySecureStorage::new());
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::Noiseless);

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        verifier.mark_sent(&request.nonce, Ticks::new(0)).unwrap();
        let response = device_side.respond(&request, Ticks::new(0)).unwrap();

        // truncate the persisted record while the session is open
        let mut storage = store.into_inner();
        let mut buf = [0u8; 256];
        let len = storage.read(0, &mut buf).unwrap();
        storage.write(0, &buf[..len - 4]).unwrap();
        let store: Slots = SlotStore::new(storage);

        let decision = verifier.handle_proof(&store, &response, Ticks::new(1));
        assert_eq!(
            decision,
            AuthDecision::Rejected(RejectReason::VerifierFault(Error::StorageCorrupted))
        );
        assert_eq!(
            verifier.session_state(&request.nonce),
            Some(SessionState::Rejected)
        );
        assert_eq!(verifier.log().count_category(EventCategory::Availability), 1);
        // a store fault is not an attack signal
        assert_eq!(
            verifier.limiter_mut().remaining(&device(1), Ticks::new(1)),
            u32::from(ProtocolConfig::DEFAULT.mismatch_burst)
        );
    }

    #[test]
    fn test_removed_record_is_unknown_challenge() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::Noiseless);

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        verifier.mark_sent(&request.nonce, Ticks::new(0)).unwrap();
        let response = device_side.respond(&request, Ticks::new(0)).unwrap();
        store.remove(&device(1), CHALLENGE).unwrap();

        assert_eq!(
            verifier.handle_proof(&store, &response, Ticks::new(1)),
            AuthDecision::Rejected(RejectReason::UnknownChallenge)
        );
    }
}

mod entropy_tests {
    use super::*;

    #[test]
    fn test_hardware_seeded_verifier() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let rng = nonce_rng(SimulatedTrng::new(0xC0FFEE))
            .unwrap()
            .with_reseed_interval(1);
        let mut verifier: AuthenticationVerifier<NonceRng<SimulatedTrng>> =
            AuthenticationVerifier::new(rng, ProtocolConfig::DEFAULT).unwrap();
        let mut device_side = responder(1, NoiseModel::FixedWeight(T / 2));

        let mut nonces = [None; 2];
        for (i, slot) in nonces.iter_mut().enumerate() {
            let now = Ticks::new(i as u64 * 100);
            let request = verifier.issue(&store, device(1), CHALLENGE, now).unwrap();
            verifier.mark_sent(&request.nonce, now).unwrap();
            let response = device_side.respond(&request, now).unwrap();
            assert!(verifier.handle_proof(&store, &response, now + 1).is_accepted());
            *slot = Some(request.nonce);
        }
        assert_ne!(nonces[0], nonces[1]);
    }

    #[test]
    fn test_dead_entropy_source_refused() {
        let mut trng = SimulatedTrng::new(1);
        trng.set_stuck(Some(0xFF));
        assert_eq!(nonce_rng(trng).err(), Some(Error::RngFailure));
    }
}

mod codec_tests {
    use super::*;

    #[test]
    fn test_challenge_request_on_the_wire() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();

        let bytes = request.to_bytes().unwrap();
        assert_eq!(ChallengeRequest::from_bytes(&bytes).unwrap(), request);

        assert_eq!(
            ChallengeRequest::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err(),
            Error::MalformedMessage
        );
        assert_eq!(
            ChallengeRequest::from_bytes(&bytes[..20]).unwrap_err(),
            Error::MalformedMessage
        );
        let mut foreign = bytes.clone();
        foreign[0] = 0x09;
        assert_eq!(
            ChallengeRequest::from_bytes(&foreign).unwrap_err(),
            Error::UnsupportedVersion
        );
        let mut wrong_type = bytes;
        wrong_type[1] = 0x02;
        assert_eq!(
            ChallengeRequest::from_bytes(&wrong_type).unwrap_err(),
            Error::MalformedMessage
        );
    }

    #[test]
    fn test_session_over_bytes() {
        let mut store = Store::new();
        enroll(&mut store, 1);
        let mut verifier = verifier(ProtocolConfig::DEFAULT);
        let mut device_side = responder(1, NoiseModel::FixedWeight(T));

        let request = verifier
            .issue(&store, device(1), CHALLENGE, Ticks::new(0))
            .unwrap();
        verifier.mark_sent(&request.nonce, Ticks::new(0)).unwrap();

        let wire_request = request.to_bytes().unwrap();
        let received = ChallengeRequest::from_bytes(&wire_request).unwrap();
        let wire_response = device_side
            .respond(&received, Ticks::new(1))
            .unwrap()
            .to_bytes();

        let decision = verifier.handle_proof(
            &store,
            &ProofResponse::from_bytes(&wire_response).unwrap(),
            Ticks::new(2),
        );
        let wire_result = decision.to_result(request.nonce).to_bytes();
        let result = AuthResult::from_bytes(&wire_result).unwrap();
        assert!(result.accepted);
        assert_eq!(result.nonce, request.nonce);
    }
}

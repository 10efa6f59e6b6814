// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Verifier side of the authentication protocol
//!
//! The verifier issues challenges with fresh nonces, tracks each session to
//! a terminal state and checks returned proofs against enrolled
//! commitments. It never sees a PUF response or a derived key.

use heapless::Vec;
use q_common::constants::MAX_SESSIONS;
use q_common::{
    log_info, log_warn, ChallengeId, DeviceId, Error, EventCategory, LogBuffer, ProtocolConfig,
    Result, SessionNonce, Ticks,
};
use q_crypto::rng::random_bytes;
use q_crypto::{CryptoRng, HkdfSha3_256, Kdf};
use q_identity::{ChallengeResponseStore, VerifierRegenerator};

use crate::protocol::{AuthResult, ChallengeRequest, ProofResponse, ProofStatus};
use crate::ratelimit::MismatchLimiter;
use crate::session::{ProtocolSession, SessionState};

const MODULE: &str = "verifier";

/// Fresh nonce draws before giving up on a collision
const NONCE_ATTEMPTS: usize = 4;

/// Why a proof was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RejectReason {
    /// Nonce does not belong to any tracked session
    UnknownSession,
    /// Session already reached a terminal state
    StaleNonce,
    /// Proof arrived after the deadline
    TimedOut,
    /// Proof arrived before the challenge was marked sent
    OutOfOrder,
    /// Device reported regeneration failure
    RegenerationFailed,
    /// Proof does not match the enrolled commitment
    Mismatch,
    /// Enrollment record vanished mid-session
    UnknownChallenge,
    /// Store or key schedule failed while checking the proof
    VerifierFault(Error),
}

impl RejectReason {
    /// Error equivalent of the reason
    #[must_use]
    pub const fn as_error(self) -> Error {
        match self {
            Self::UnknownSession => Error::InvalidSession,
            Self::StaleNonce => Error::StaleNonce,
            Self::TimedOut => Error::TimedOut,
            Self::OutOfOrder => Error::InvalidState,
            Self::RegenerationFailed => Error::RegenerationFailed,
            Self::Mismatch => Error::VerificationMismatch,
            Self::UnknownChallenge => Error::UnknownChallenge,
            Self::VerifierFault(error) => error,
        }
    }
}

/// Outcome of handling a proof response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthDecision {
    /// Device authenticated
    Accepted,
    /// Device not authenticated
    Rejected(RejectReason),
}

impl AuthDecision {
    /// Whether the device was authenticated
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Result message for session `nonce`
    #[must_use]
    pub const fn to_result(&self, nonce: SessionNonce) -> AuthResult {
        AuthResult {
            nonce,
            accepted: self.is_accepted(),
        }
    }
}

/// Verifier driving sessions with randomness `R` and KDF `K`
///
/// Nonces are the replay defence. A deployed verifier takes `R` from
/// [`nonce_rng`](crate::entropy::nonce_rng), a DRBG seeded by the hardware
/// entropy source.
pub struct AuthenticationVerifier<R, K = HkdfSha3_256> {
    rng: R,
    config: ProtocolConfig,
    sessions: Vec<ProtocolSession, MAX_SESSIONS>,
    limiter: MismatchLimiter,
    verifier: VerifierRegenerator<K>,
    log: LogBuffer,
}

impl<R: CryptoRng, K: Kdf> AuthenticationVerifier<R, K> {
    /// Create a verifier
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an invalid configuration.
    pub fn new(rng: R, config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng,
            config,
            sessions: Vec::new(),
            limiter: MismatchLimiter::new(config.mismatch_burst, config.mismatch_refill),
            verifier: VerifierRegenerator::new(),
            log: LogBuffer::new(),
        })
    }

    /// Start a session for `(device, challenge)`
    ///
    /// The session is tracked in `ChallengeIssued` until
    /// [`AuthenticationVerifier::mark_sent`] is called.
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` for a device over its mismatch budget,
    /// `SessionInFlight` if the pair already has an open session,
    /// `UnknownChallenge` if the pair is not enrolled, `SessionTableFull`
    /// when no slot can be reclaimed and `RngFailure` if no fresh nonce
    /// could be drawn.
    pub fn issue<S: ChallengeResponseStore + ?Sized>(
        &mut self,
        store: &S,
        device: DeviceId,
        challenge: ChallengeId,
        now: Ticks,
    ) -> Result<ChallengeRequest> {
        self.poll_timeouts(now);
        let ts = now.as_u64();

        if !self.limiter.check(&device, now) {
            log_warn!(
                self.log,
                ts,
                EventCategory::Security,
                MODULE,
                "{} rate limited",
                device
            );
            return Err(Error::RateLimited);
        }

        if self.sessions.iter().any(|s| {
            s.device_id() == &device && s.challenge_id() == challenge && !s.state().is_terminal()
        }) {
            return Err(Error::SessionInFlight);
        }

        let record = store.get(&device, challenge)?;
        let nonce = self.fresh_nonce()?;

        if self.sessions.len() >= usize::from(self.config.max_sessions) {
            self.purge_terminal();
        }
        if self.sessions.len() >= usize::from(self.config.max_sessions) {
            log_warn!(
                self.log,
                ts,
                EventCategory::Availability,
                MODULE,
                "session table full ({})",
                self.sessions.len()
            );
            return Err(Error::SessionTableFull);
        }

        let mut session = ProtocolSession::new(device, challenge, nonce);
        session.issue(now, self.config.session_timeout)?;
        self.sessions
            .push(session)
            .map_err(|_| Error::SessionTableFull)?;

        Ok(ChallengeRequest {
            device_id: device,
            challenge_id: challenge,
            nonce,
            helper_data: record.helper_data,
        })
    }

    fn fresh_nonce(&mut self) -> Result<SessionNonce> {
        for _ in 0..NONCE_ATTEMPTS {
            let nonce = SessionNonce::new(random_bytes::<16>(&mut self.rng)?);
            if self.find(&nonce).is_none() {
                return Ok(nonce);
            }
        }
        Err(Error::RngFailure)
    }

    fn find(&self, nonce: &SessionNonce) -> Option<usize> {
        self.sessions.iter().position(|s| s.nonce() == nonce)
    }

    /// Record that the challenge for `nonce` was handed to the transport
    ///
    /// # Errors
    ///
    /// Returns `InvalidSession` for an unknown nonce, `TimedOut` if the
    /// deadline already passed and `InvalidState` if the session is not
    /// waiting to be sent.
    pub fn mark_sent(&mut self, nonce: &SessionNonce, now: Ticks) -> Result<()> {
        let index = self.find(nonce).ok_or(Error::InvalidSession)?;
        self.sessions[index].mark_sent(now)
    }

    /// Check a proof response and settle its session
    ///
    /// A tracked session ends in a terminal state unless the proof arrived
    /// before [`AuthenticationVerifier::mark_sent`]. A stale or unknown
    /// nonce leaves the table untouched.
    pub fn handle_proof<S: ChallengeResponseStore + ?Sized>(
        &mut self,
        store: &S,
        response: &ProofResponse,
        now: Ticks,
    ) -> AuthDecision {
        let ts = now.as_u64();
        let Some(index) = self.find(&response.nonce) else {
            log_warn!(
                self.log,
                ts,
                EventCategory::Security,
                MODULE,
                "proof for unknown nonce {:?}",
                response.nonce
            );
            return AuthDecision::Rejected(RejectReason::UnknownSession);
        };

        let session = &mut self.sessions[index];
        let device = *session.device_id();
        let challenge = session.challenge_id();

        if session.state().is_terminal() {
            log_warn!(
                self.log,
                ts,
                EventCategory::Security,
                MODULE,
                "replayed nonce for {} ({:?})",
                device,
                session.state()
            );
            return AuthDecision::Rejected(RejectReason::StaleNonce);
        }

        if session.expire_if_due(now) {
            log_warn!(
                self.log,
                ts,
                EventCategory::Availability,
                MODULE,
                "{} {} proof after deadline",
                device,
                challenge
            );
            return AuthDecision::Rejected(RejectReason::TimedOut);
        }

        if session.state() != SessionState::AwaitingProof {
            return AuthDecision::Rejected(RejectReason::OutOfOrder);
        }

        let decision = match response.status {
            ProofStatus::RegenerationFailed => {
                AuthDecision::Rejected(RejectReason::RegenerationFailed)
            }
            ProofStatus::Proof => match self.verifier.verify(
                store,
                &device,
                challenge,
                &response.nonce,
                &response.proof,
            ) {
                Ok(verdict) if verdict.is_accept() => AuthDecision::Accepted,
                Ok(_) => AuthDecision::Rejected(RejectReason::Mismatch),
                Err(Error::UnknownChallenge) => {
                    AuthDecision::Rejected(RejectReason::UnknownChallenge)
                }
                Err(error) => AuthDecision::Rejected(RejectReason::VerifierFault(error)),
            },
        };

        let resolved = self.sessions[index].resolve(decision.is_accepted());
        debug_assert!(resolved.is_ok(), "AwaitingProof admits every resolution");

        match decision {
            AuthDecision::Accepted => log_info!(
                self.log,
                ts,
                EventCategory::Security,
                MODULE,
                "{} {} accepted",
                device,
                challenge
            ),
            AuthDecision::Rejected(RejectReason::Mismatch) => {
                log_warn!(
                    self.log,
                    ts,
                    EventCategory::Security,
                    MODULE,
                    "{} {} proof mismatch",
                    device,
                    challenge
                );
                if !self.limiter.record_mismatch(&device, now) {
                    log_warn!(
                        self.log,
                        ts,
                        EventCategory::Security,
                        MODULE,
                        "{} mismatch not tracked, limiter saturated",
                        device
                    );
                }
            }
            AuthDecision::Rejected(RejectReason::VerifierFault(error)) => log_warn!(
                self.log,
                ts,
                EventCategory::Availability,
                MODULE,
                "{} {} not verified: {}",
                device,
                challenge,
                error
            ),
            AuthDecision::Rejected(reason) => log_warn!(
                self.log,
                ts,
                EventCategory::Security,
                MODULE,
                "{} {} rejected: {}",
                device,
                challenge,
                reason.as_error()
            ),
        }
        decision
    }

    /// Time out every overdue session, returning how many expired
    pub fn poll_timeouts(&mut self, now: Ticks) -> usize {
        let mut expired = 0;
        for session in &mut self.sessions {
            if session.expire_if_due(now) {
                expired += 1;
                log_warn!(
                    self.log,
                    now.as_u64(),
                    EventCategory::Availability,
                    MODULE,
                    "{} {} timed out",
                    session.device_id(),
                    session.challenge_id()
                );
            }
        }
        expired
    }

    /// Drop terminal sessions, returning how many were dropped
    pub fn purge_terminal(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| !s.state().is_terminal());
        before - self.sessions.len()
    }

    /// State of the session owning `nonce`
    #[must_use]
    pub fn session_state(&self, nonce: &SessionNonce) -> Option<SessionState> {
        self.find(nonce).map(|i| self.sessions[i].state())
    }

    /// Sessions not yet in a terminal state
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| !s.state().is_terminal())
            .count()
    }

    /// Sessions tracked, terminal ones included
    #[must_use]
    pub fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Configuration
    #[must_use]
    pub const fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Mismatch limiter
    pub fn limiter_mut(&mut self) -> &mut MismatchLimiter {
        &mut self.limiter
    }

    /// Event log
    #[must_use]
    pub const fn log(&self) -> &LogBuffer {
        &self.log
    }
}

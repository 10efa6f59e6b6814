// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Verifier-side session state machine
//!
//! ```text
//! Idle ──issue──► ChallengeIssued ──sent──► AwaitingProof ──┬──► Accepted
//!                       │                        │          └──► Rejected
//!                       └────────deadline────────┴─────────────► TimedOut
//! ```
//!
//! Terminal states never transition again. A nonce belongs to exactly one
//! session for the lifetime of the verifier.

use q_common::{ChallengeId, Deadline, DeviceId, Error, Millis, Result, SessionNonce, Ticks};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Not yet issued
    Idle,
    /// Challenge built, not yet handed to the transport
    ChallengeIssued,
    /// Challenge sent, waiting for the device
    AwaitingProof,
    /// Proof verified
    Accepted,
    /// Proof rejected or device reported failure
    Rejected,
    /// Deadline passed before a proof arrived
    TimedOut,
}

impl SessionState {
    /// Whether the state is final
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::TimedOut)
    }

    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::ChallengeIssued)
                | (Self::ChallengeIssued, Self::AwaitingProof | Self::TimedOut)
                | (
                    Self::AwaitingProof,
                    Self::Accepted | Self::Rejected | Self::TimedOut
                )
        )
    }
}

/// One authentication attempt tracked by the verifier
#[derive(Debug, Clone)]
pub struct ProtocolSession {
    device_id: DeviceId,
    challenge_id: ChallengeId,
    nonce: SessionNonce,
    state: SessionState,
    deadline: Option<Deadline>,
    issued_at: Ticks,
}

impl ProtocolSession {
    /// Create an idle session
    #[must_use]
    pub const fn new(device_id: DeviceId, challenge_id: ChallengeId, nonce: SessionNonce) -> Self {
        Self {
            device_id,
            challenge_id,
            nonce,
            state: SessionState::Idle,
            deadline: None,
            issued_at: Ticks::new(0),
        }
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::InvalidState);
        }
        self.state = next;
        Ok(())
    }

    /// Issue the challenge and arm the deadline
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the session is idle.
    pub fn issue(&mut self, now: Ticks, timeout: Millis) -> Result<()> {
        self.transition(SessionState::ChallengeIssued)?;
        self.issued_at = now;
        self.deadline = Some(Deadline::after(now, timeout));
        Ok(())
    }

    /// Record that the challenge left the verifier
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` (and moves to `TimedOut`) if the deadline already
    /// passed, and `InvalidState` from any state but `ChallengeIssued`.
    pub fn mark_sent(&mut self, now: Ticks) -> Result<()> {
        if self.state == SessionState::ChallengeIssued && self.is_overdue(now) {
            self.state = SessionState::TimedOut;
            return Err(Error::TimedOut);
        }
        self.transition(SessionState::AwaitingProof)
    }

    /// Settle an awaited proof
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the session is awaiting a proof.
    pub fn resolve(&mut self, accepted: bool) -> Result<()> {
        self.transition(if accepted {
            SessionState::Accepted
        } else {
            SessionState::Rejected
        })
    }

    /// Move to `TimedOut` if the deadline passed; returns whether it did
    pub fn expire_if_due(&mut self, now: Ticks) -> bool {
        if !self.state.is_terminal() && self.is_overdue(now) {
            self.state = SessionState::TimedOut;
            return true;
        }
        false
    }

    /// Whether the deadline has passed at `now`
    #[must_use]
    pub fn is_overdue(&self, now: Ticks) -> bool {
        self.deadline.is_some_and(|d| d.is_expired(now))
    }

    /// Device under authentication
    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Challenge in use
    #[must_use]
    pub const fn challenge_id(&self) -> ChallengeId {
        self.challenge_id
    }

    /// Session nonce
    #[must_use]
    pub const fn nonce(&self) -> &SessionNonce {
        &self.nonce
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Tick at which the challenge was issued
    #[must_use]
    pub const fn issued_at(&self) -> Ticks {
        self.issued_at
    }

    /// Deadline, once issued
    #[must_use]
    pub const fn deadline(&self) -> Option<Deadline> {
        self.deadline
    }
}

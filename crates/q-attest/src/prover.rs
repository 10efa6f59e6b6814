// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Device side of the authentication protocol

use q_common::{log_info, log_warn, Error, EventCategory, LogBuffer, Result, Ticks};
use q_crypto::{HkdfSha3_256, Kdf};
use q_fuzzy::ErrorCorrectingCode;
use q_hal::PufInterface;
use q_identity::DeviceRegenerator;

use crate::protocol::{ChallengeRequest, ProofResponse};

const MODULE: &str = "prover";

/// Answers challenge requests for one device
pub struct AuthenticationResponder<P, E, K = HkdfSha3_256> {
    regenerator: DeviceRegenerator<P, E, K>,
    log: LogBuffer,
}

impl<P, E, K> AuthenticationResponder<P, E, K>
where
    P: PufInterface,
    E: ErrorCorrectingCode,
    K: Kdf,
{
    /// Wrap a device regenerator
    #[must_use]
    pub fn new(regenerator: DeviceRegenerator<P, E, K>) -> Self {
        Self {
            regenerator,
            log: LogBuffer::new(),
        }
    }

    /// Build the proof response for `request`
    ///
    /// An exhausted regeneration budget is reported in-band with
    /// [`ProofResponse::regeneration_failed`].
    ///
    /// # Errors
    ///
    /// Returns `DeviceMismatch` for a request addressed to another device and
    /// propagates PUF and parameter errors.
    pub fn respond(&mut self, request: &ChallengeRequest, now: Ticks) -> Result<ProofResponse> {
        let ts = now.as_u64();
        if &request.device_id != self.regenerator.device_id() {
            log_warn!(
                self.log,
                ts,
                EventCategory::Security,
                MODULE,
                "request for foreign device {}",
                request.device_id
            );
            return Err(Error::DeviceMismatch);
        }

        match self
            .regenerator
            .regenerate(request.challenge_id, &request.helper_data, &request.nonce)
        {
            Ok(proof) => {
                log_info!(
                    self.log,
                    ts,
                    EventCategory::Diagnostic,
                    MODULE,
                    "{} proved in {} attempt(s)",
                    request.challenge_id,
                    self.regenerator.last_attempts()
                );
                Ok(ProofResponse::with_proof(request.nonce, proof))
            }
            Err(Error::RegenerationFailed) => {
                log_warn!(
                    self.log,
                    ts,
                    EventCategory::Security,
                    MODULE,
                    "{} regeneration failed after {} attempts",
                    request.challenge_id,
                    self.regenerator.last_attempts()
                );
                Ok(ProofResponse::regeneration_failed(request.nonce))
            }
            Err(e) => Err(e),
        }
    }

    /// Underlying regenerator
    pub fn regenerator(&self) -> &DeviceRegenerator<P, E, K> {
        &self.regenerator
    }

    /// Underlying regenerator, mutably
    pub fn regenerator_mut(&mut self) -> &mut DeviceRegenerator<P, E, K> {
        &mut self.regenerator
    }

    /// Event log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }
}

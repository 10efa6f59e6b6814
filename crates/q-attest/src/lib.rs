// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Q-ATTEST: PUF challenge-response authentication protocol
//!
//! - **Protocol**: wire messages between verifier and device
//! - **Session**: verifier-side session state machine with deadlines
//! - **Verifier**: challenge issue, proof check, replay and timeout handling
//! - **Prover**: device-side proof generation with bounded retry
//! - **Rate limiting**: per-device mismatch budget
//! - **Entropy**: nonce DRBG seeded from the hardware entropy source
//!
//! # Example
//!
//! ```text
//! let rng = nonce_rng(trng)?;
//! let mut verifier = AuthenticationVerifier::new(rng, ProtocolConfig::DEFAULT)?;
//! let request = verifier.issue(&store, device, challenge, now)?;
//! verifier.mark_sent(&request.nonce, now)?;
//! let response = responder.respond(&request, now)?;      // on the device
//! let decision = verifier.handle_proof(&store, &response, now);
//! let result = decision.to_result(request.nonce);
//! ```

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod entropy;
pub mod protocol;
pub mod prover;
pub mod ratelimit;
pub mod session;
pub mod verifier;

pub use entropy::{nonce_rng, HalEntropy, NonceRng};
pub use protocol::{
    message_type, AuthResult, ChallengeRequest, MessageType, ProofResponse, ProofStatus,
};
pub use prover::AuthenticationResponder;
pub use ratelimit::MismatchLimiter;
pub use session::{ProtocolSession, SessionState};
pub use verifier::{AuthDecision, AuthenticationVerifier, RejectReason};

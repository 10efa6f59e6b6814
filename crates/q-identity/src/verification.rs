// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Verifier-side proof checking
//!
//! The verifier never sees the response or the key. It recomputes the
//! session proof from the stored key commitment and compares in constant
//! time. The store is only read.

use core::marker::PhantomData;

use q_common::{ChallengeId, DeviceId, Proof, Result, SessionNonce};
use q_crypto::{constant_time_eq, HkdfSha3_256, Kdf, PufKdf};

use crate::storage::ChallengeResponseStore;

/// Outcome of a proof check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Proof matches the enrolled commitment
    Accept,
    /// Proof does not match
    Reject,
}

impl Verdict {
    /// Whether the proof was accepted
    #[must_use]
    pub const fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Checks device proofs against enrolled commitments
pub struct VerifierRegenerator<K = HkdfSha3_256> {
    _kdf: PhantomData<K>,
}

impl<K: Kdf> VerifierRegenerator<K> {
    /// Create a verifier
    #[must_use]
    pub const fn new() -> Self {
        Self { _kdf: PhantomData }
    }

    /// Check `proof` for `(device, challenge)` under session `nonce`
    ///
    /// # Errors
    ///
    /// Returns `UnknownChallenge` if the pair is not enrolled and propagates
    /// store and KDF errors.
    pub fn verify<S: ChallengeResponseStore + ?Sized>(
        &self,
        store: &S,
        device: &DeviceId,
        challenge: ChallengeId,
        nonce: &SessionNonce,
        proof: &Proof,
    ) -> Result<Verdict> {
        let record = store.get(device, challenge)?;
        let expected = PufKdf::<K>::expected_proof(&record.commitment, device, challenge, nonce)?;

        if constant_time_eq(expected.as_bytes(), proof.as_bytes()) {
            Ok(Verdict::Accept)
        } else {
            Ok(Verdict::Reject)
        }
    }
}

impl<K: Kdf> Default for VerifierRegenerator<K> {
    fn default() -> Self {
        Self::new()
    }
}

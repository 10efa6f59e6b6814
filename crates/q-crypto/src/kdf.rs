// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! PUF key schedule
//!
//! Turns a reconstructed PUF response into an enrollment key, a one-way
//! commitment, and session-bound proofs:
//!
//! ```text
//! K  = KDF(ikm = response, salt = ENROLL_SALT, info = ENROLL_INFO || device || challenge)
//! C  = SHA3-256(COMMIT_LABEL || K)
//! SK = KDF(ikm = C, salt = nonce, info = SESSION_INFO || device || challenge)
//! P  = SHA3-256(PROOF_LABEL || SK)
//! ```
//!
//! The device computes `P` from `K`; the verifier computes the same `P` from
//! the stored `C`. `C` reveals neither `K` nor the response, but it is
//! sufficient to produce proofs and must be access-controlled like any
//! verification credential.
//!
//! The derivation function is a type parameter implementing [`Kdf`], with
//! HKDF-SHA3-256 as the default.

use core::marker::PhantomData;

use heapless::Vec;
use q_common::constants::DERIVED_KEY_SIZE;
use q_common::{ChallengeId, DeviceId, KeyCommitment, Proof, SessionNonce};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::hash::{sha3_256_parts, HkdfSha3_256};
use crate::traits::Kdf;

const ENROLL_SALT: &[u8] = b"q-crypto/puf/enroll-salt/v1";
const ENROLL_INFO: &[u8] = b"q-crypto/puf/enroll-key/v1";
const COMMIT_LABEL: &[u8] = b"q-crypto/puf/commitment/v1";
const SESSION_INFO: &[u8] = b"q-crypto/puf/session-key/v1";
const PROOF_LABEL: &[u8] = b"q-crypto/puf/proof/v1";

/// Capacity of the context buffer (label + device + challenge)
const CONTEXT_CAPACITY: usize = 96;

/// Enrollment key derived from a reconstructed response
///
/// Held only by the enrollment engine and the device regenerator, zeroized
/// on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_SIZE]);

impl DerivedKey {
    /// Key bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.0
    }
}

impl core::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

/// Per-session key, zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; DERIVED_KEY_SIZE]);

/// PUF key schedule over a derivation function `K`
pub struct PufKdf<K: Kdf = HkdfSha3_256> {
    _kdf: PhantomData<K>,
}

impl<K: Kdf> PufKdf<K> {
    /// Derive the enrollment key from a reconstructed response
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is empty or the
    /// underlying KDF fails.
    pub fn derive_key(
        secret: &[u8],
        device: &DeviceId,
        challenge: ChallengeId,
    ) -> Result<DerivedKey, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::KeyDerivationFailed);
        }
        let info = context(ENROLL_INFO, device, challenge)?;
        let mut key = DerivedKey([0u8; DERIVED_KEY_SIZE]);
        K::derive(secret, ENROLL_SALT, &info, &mut key.0)?;
        Ok(key)
    }

    /// One-way commitment to an enrollment key
    #[must_use]
    pub fn commit(key: &DerivedKey) -> KeyCommitment {
        KeyCommitment::new(sha3_256_parts(&[COMMIT_LABEL, &key.0]).into_bytes())
    }

    /// Session key bound to a commitment, context and nonce
    ///
    /// # Errors
    ///
    /// Propagates KDF failure.
    pub fn session_key(
        commitment: &KeyCommitment,
        device: &DeviceId,
        challenge: ChallengeId,
        nonce: &SessionNonce,
    ) -> Result<SessionKey, CryptoError> {
        let info = context(SESSION_INFO, device, challenge)?;
        let mut key = SessionKey([0u8; DERIVED_KEY_SIZE]);
        K::derive(commitment.as_bytes(), nonce.as_bytes(), &info, &mut key.0)?;
        Ok(key)
    }

    /// Proof value for a session key
    #[must_use]
    pub fn proof(session_key: &SessionKey) -> Proof {
        Proof::new(sha3_256_parts(&[PROOF_LABEL, &session_key.0]).into_bytes())
    }

    /// Device side: proof from the enrollment key
    ///
    /// # Errors
    ///
    /// Propagates KDF failure.
    pub fn device_proof(
        key: &DerivedKey,
        device: &DeviceId,
        challenge: ChallengeId,
        nonce: &SessionNonce,
    ) -> Result<Proof, CryptoError> {
        let mut commitment = Self::commit(key);
        let session = Self::session_key(&commitment, device, challenge, nonce);
        commitment.zeroize();
        Ok(Self::proof(&session?))
    }

    /// Verifier side: expected proof from the stored commitment
    ///
    /// # Errors
    ///
    /// Propagates KDF failure.
    pub fn expected_proof(
        commitment: &KeyCommitment,
        device: &DeviceId,
        challenge: ChallengeId,
        nonce: &SessionNonce,
    ) -> Result<Proof, CryptoError> {
        let session = Self::session_key(commitment, device, challenge, nonce)?;
        Ok(Self::proof(&session))
    }
}

/// `label || device || challenge_le`
fn context(
    label: &[u8],
    device: &DeviceId,
    challenge: ChallengeId,
) -> Result<Vec<u8, CONTEXT_CAPACITY>, CryptoError> {
    let mut info = Vec::new();
    info.extend_from_slice(label)
        .and_then(|()| info.extend_from_slice(device.as_bytes()))
        .and_then(|()| info.extend_from_slice(&challenge.to_le_bytes()))
        .map_err(|()| CryptoError::ContextTooLong)?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    type Schedule = PufKdf<HkdfSha3_256>;

    fn device(b: u8) -> DeviceId {
        DeviceId::new([b; 32])
    }

    #[test]
    fn test_derive_is_deterministic() {
        let secret = [0x5Au8; 32];
        let a = Schedule::derive_key(&secret, &device(1), ChallengeId::new(9)).unwrap();
        let b = Schedule::derive_key(&secret, &device(1), ChallengeId::new(9)).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_derive_is_context_sensitive() {
        let secret = [0x5Au8; 32];
        let base = Schedule::derive_key(&secret, &device(1), ChallengeId::new(9)).unwrap();
        let other_dev = Schedule::derive_key(&secret, &device(2), ChallengeId::new(9)).unwrap();
        let other_chal = Schedule::derive_key(&secret, &device(1), ChallengeId::new(10)).unwrap();
        assert_ne!(base.as_bytes(), other_dev.as_bytes());
        assert_ne!(base.as_bytes(), other_chal.as_bytes());

        let mut flipped = secret;
        flipped[0] ^= 1;
        let other_secret = Schedule::derive_key(&flipped, &device(1), ChallengeId::new(9)).unwrap();
        assert_ne!(base.as_bytes(), other_secret.as_bytes());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(
            Schedule::derive_key(&[], &device(1), ChallengeId::new(1)).unwrap_err(),
            CryptoError::KeyDerivationFailed
        );
    }

    #[test]
    fn test_commitment_differs_from_key() {
        let key = Schedule::derive_key(&[1u8; 32], &device(1), ChallengeId::new(1)).unwrap();
        let c = Schedule::commit(&key);
        assert_ne!(c.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_device_and_verifier_agree() {
        let dev = device(3);
        let chal = ChallengeId::new(42);
        let nonce = SessionNonce::new([7u8; 16]);
        let key = Schedule::derive_key(&[0xC3u8; 32], &dev, chal).unwrap();
        let commitment = Schedule::commit(&key);

        let from_device = Schedule::device_proof(&key, &dev, chal, &nonce).unwrap();
        let from_verifier = Schedule::expected_proof(&commitment, &dev, chal, &nonce).unwrap();
        assert_eq!(from_device, from_verifier);
    }

    #[test]
    fn test_proof_bound_to_nonce() {
        let dev = device(3);
        let chal = ChallengeId::new(42);
        let key = Schedule::derive_key(&[0xC3u8; 32], &dev, chal).unwrap();
        let p1 = Schedule::device_proof(&key, &dev, chal, &SessionNonce::new([1; 16])).unwrap();
        let p2 = Schedule::device_proof(&key, &dev, chal, &SessionNonce::new([2; 16])).unwrap();
        assert_ne!(p1, p2);
    }
}

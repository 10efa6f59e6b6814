// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Common types for PUF authentication
//!
//! Identifiers (device, challenge), protocol values (nonce, proof) and the
//! key commitment persisted by the verifier. Secret-bearing bit vectors live
//! in [`crate::bits`].

use core::fmt;
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Unique device identifier (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId([u8; 32]);

impl DeviceId {
    /// Size of device ID in bytes
    pub const SIZE: usize = 32;

    /// Create a new device ID from bytes
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a device ID from a slice
    ///
    /// Returns `None` if the slice length is not exactly 32 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != Self::SIZE {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }

    /// Get the device ID as a byte slice
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if the device ID is all zeros (invalid)
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl AsRef<[u8]> for DeviceId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...)")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")
    }
}

/// Challenge identifier selecting a measurement locus on the PUF
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChallengeId(u32);

impl ChallengeId {
    /// Size of the encoded challenge ID in bytes
    pub const SIZE: usize = 4;

    /// Create a new challenge ID
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Little-endian encoding
    #[must_use]
    pub const fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Decode from little-endian bytes
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl From<u32> for ChallengeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Per-session random nonce (16 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionNonce([u8; 16]);

impl SessionNonce {
    /// Size of nonce in bytes
    pub const SIZE: usize = 16;

    /// Create a nonce from bytes
    #[must_use]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a nonce from a slice
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != Self::SIZE {
            return None;
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }

    /// Get the nonce bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl AsRef<[u8]> for SessionNonce {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionNonce(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...)")
    }
}

/// One-way commitment to an enrollment key (32 bytes)
///
/// Stored by the verifier. It cannot be reversed to the key or the PUF
/// response, but it is sufficient to compute session proofs, so it must be
/// kept under the same access control as any verification credential.
#[derive(Clone, Zeroize)]
pub struct KeyCommitment([u8; 32]);

impl KeyCommitment {
    /// Size of commitment in bytes
    pub const SIZE: usize = 32;

    /// Create a commitment from bytes
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a commitment from a slice
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != Self::SIZE {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }

    /// Get the commitment bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl ConstantTimeEq for KeyCommitment {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for KeyCommitment {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for KeyCommitment {}

impl fmt::Debug for KeyCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyCommitment([REDACTED])")
    }
}

/// Session-bound proof sent from device to verifier (32 bytes)
#[derive(Clone, Copy, Default)]
pub struct Proof([u8; 32]);

impl Proof {
    /// Size of proof in bytes
    pub const SIZE: usize = 32;

    /// Create a proof from bytes
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a proof from a slice
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != Self::SIZE {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }

    /// Get the proof bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl ConstantTimeEq for Proof {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for Proof {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Proof {}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proof([REDACTED])")
    }
}

/// Timestamp type (Unix seconds since epoch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a new timestamp
    #[must_use]
    pub const fn new(unix_seconds: u64) -> Self {
        Self(unix_seconds)
    }

    /// Get the Unix timestamp value
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Get the duration since this timestamp (returns 0 if in the future)
    #[must_use]
    pub const fn elapsed_since(&self, now: &Self) -> u64 {
        if now.0 > self.0 {
            now.0 - self.0
        } else {
            0
        }
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_from_slice() {
        assert!(DeviceId::from_slice(&[0xAB; 32]).is_some());
        assert!(DeviceId::from_slice(&[0xAB; 16]).is_none());
        assert!(DeviceId::new([0; 32]).is_zero());
    }

    #[test]
    fn test_challenge_id_le_roundtrip() {
        let c = ChallengeId::new(0x0102_0304);
        assert_eq!(c.to_le_bytes(), [4, 3, 2, 1]);
        assert_eq!(ChallengeId::from_le_bytes(c.to_le_bytes()), c);
    }

    #[test]
    fn test_proof_equality() {
        let a = Proof::new([7; 32]);
        let mut bytes = [7; 32];
        bytes[31] = 8;
        assert_eq!(a, Proof::new([7; 32]));
        assert_ne!(a, Proof::new(bytes));
    }

    #[test]
    fn test_secret_types_redacted_in_debug() {
        extern crate std;
        use std::format;
        let c = KeyCommitment::new([0x5A; 32]);
        assert_eq!(format!("{c:?}"), "KeyCommitment([REDACTED])");
        let p = Proof::new([0x5A; 32]);
        assert!(!format!("{p:?}").contains("5a"));
    }
}

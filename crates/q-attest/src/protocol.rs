// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Authentication Protocol Messages
//!
//! Wire formats exchanged between verifier and device over a reliable,
//! ordered transport.
//!
//! # Protocol Overview
//!
//! ```text
//! Verifier                                    Device
//!    |                                              |
//!    |------------- ChallengeRequest ------------->|
//!    |        (device, challenge, nonce, helper)   |
//!    |                                              |
//!    |                                   Measure PUF
//!    |                                   Correct with helper
//!    |                                   Derive key, prove
//!    |                                              |
//!    |<-------------- ProofResponse ---------------|
//!    |          (status, nonce, proof)             |
//!    |                                              |
//!    | Recompute proof from commitment             |
//!    | Constant-time compare                       |
//!    |                                              |
//!    |---------------- AuthResult ---------------->|
//!    |             (nonce, accepted)               |
//! ```
//!
//! All integers are little-endian. Every message starts with
//! `[version:1][type:1]`.

use heapless::Vec;
use q_common::constants::{MAX_HELPER_DATA_SIZE, PROTOCOL_VERSION};
use q_common::{ChallengeId, DeviceId, Error, Proof, Result, SessionNonce};
use q_fuzzy::HelperData;

/// Size of the fixed part of a challenge request
const REQUEST_HEADER_SIZE: usize = 2 + 32 + 4 + 16 + 2;

/// Largest challenge request
pub const MAX_REQUEST_SIZE: usize = REQUEST_HEADER_SIZE + MAX_HELPER_DATA_SIZE;

/// Size of a proof response
pub const PROOF_RESPONSE_SIZE: usize = 2 + 1 + 16 + 32;

/// Size of an authentication result
pub const AUTH_RESULT_SIZE: usize = 2 + 16 + 1;

// ============================================================================
// Message Type
// ============================================================================

/// Message type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Verifier to device
    ChallengeRequest = 0x01,
    /// Device to verifier
    ProofResponse = 0x02,
    /// Verifier to device
    AuthResult = 0x03,
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0x01 => Ok(Self::ChallengeRequest),
            0x02 => Ok(Self::ProofResponse),
            0x03 => Ok(Self::AuthResult),
            _ => Err(Error::MalformedMessage),
        }
    }
}

/// Peek at the type of an encoded message
///
/// # Errors
///
/// Returns `UnsupportedVersion` for a foreign version and
/// `MalformedMessage` for a short buffer or unknown type.
pub fn message_type(data: &[u8]) -> Result<MessageType> {
    if data.len() < 2 {
        return Err(Error::MalformedMessage);
    }
    if data[0] != PROTOCOL_VERSION {
        return Err(Error::UnsupportedVersion);
    }
    MessageType::try_from(data[1])
}

fn check_header(data: &[u8], expected: MessageType) -> Result<()> {
    if message_type(data)? != expected {
        return Err(Error::MalformedMessage);
    }
    Ok(())
}

// ============================================================================
// Challenge Request
// ============================================================================

/// Challenge issued by the verifier
///
/// Layout: `[ver][type][device:32][challenge:4][nonce:16][helper_len:2][helper]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    /// Addressed device
    pub device_id: DeviceId,
    /// Challenge to measure
    pub challenge_id: ChallengeId,
    /// Session nonce
    pub nonce: SessionNonce,
    /// Helper data for the challenge
    pub helper_data: HelperData,
}

impl ChallengeRequest {
    /// Serialize to bytes
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if the helper data does not fit.
    pub fn to_bytes(&self) -> Result<Vec<u8, MAX_REQUEST_SIZE>> {
        let helper = self.helper_data.to_bytes()?;
        let header = [PROTOCOL_VERSION, MessageType::ChallengeRequest as u8];
        let challenge = self.challenge_id.to_le_bytes();
        let helper_len = (helper.len() as u16).to_le_bytes();
        let parts: [&[u8]; 6] = [
            &header,
            self.device_id.as_bytes(),
            &challenge,
            self.nonce.as_bytes(),
            &helper_len,
            &helper,
        ];

        let mut bytes = Vec::new();
        for part in parts {
            bytes
                .extend_from_slice(part)
                .map_err(|()| Error::BufferTooSmall)?;
        }
        Ok(bytes)
    }

    /// Parse from bytes
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVersion` for a foreign version and
    /// `MalformedMessage` for anything that does not parse.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_header(data, MessageType::ChallengeRequest)?;
        if data.len() < REQUEST_HEADER_SIZE {
            return Err(Error::MalformedMessage);
        }

        let mut offset = 2;

        let device_id =
            DeviceId::from_slice(&data[offset..offset + 32]).ok_or(Error::MalformedMessage)?;
        offset += 32;

        let challenge_id = ChallengeId::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        offset += 4;

        let nonce =
            SessionNonce::from_slice(&data[offset..offset + 16]).ok_or(Error::MalformedMessage)?;
        offset += 16;

        let helper_len = u16::from_le_bytes([data[offset], data[offset + 1]]) as usize;
        offset += 2;

        if data.len() != offset + helper_len {
            return Err(Error::MalformedMessage);
        }
        let helper_data =
            HelperData::from_bytes(&data[offset..]).map_err(|_| Error::MalformedMessage)?;

        Ok(Self {
            device_id,
            challenge_id,
            nonce,
            helper_data,
        })
    }
}

// ============================================================================
// Proof Response
// ============================================================================

/// Outcome reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProofStatus {
    /// Proof attached
    Proof = 0x00,
    /// Regeneration budget exhausted; proof field is zero
    RegenerationFailed = 0x01,
}

impl TryFrom<u8> for ProofStatus {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0x00 => Ok(Self::Proof),
            0x01 => Ok(Self::RegenerationFailed),
            _ => Err(Error::MalformedMessage),
        }
    }
}

/// Device answer to a challenge
///
/// Layout: `[ver][type][status][nonce:16][proof:32]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofResponse {
    /// Outcome
    pub status: ProofStatus,
    /// Echo of the request nonce
    pub nonce: SessionNonce,
    /// Session proof
    pub proof: Proof,
}

impl ProofResponse {
    /// Response carrying a proof
    #[must_use]
    pub const fn with_proof(nonce: SessionNonce, proof: Proof) -> Self {
        Self {
            status: ProofStatus::Proof,
            nonce,
            proof,
        }
    }

    /// Response reporting a regeneration failure
    #[must_use]
    pub const fn regeneration_failed(nonce: SessionNonce) -> Self {
        Self {
            status: ProofStatus::RegenerationFailed,
            nonce,
            proof: Proof::new([0u8; 32]),
        }
    }

    /// Serialize to bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PROOF_RESPONSE_SIZE] {
        let mut bytes = [0u8; PROOF_RESPONSE_SIZE];
        bytes[0] = PROTOCOL_VERSION;
        bytes[1] = MessageType::ProofResponse as u8;
        bytes[2] = self.status as u8;
        bytes[3..19].copy_from_slice(self.nonce.as_bytes());
        bytes[19..51].copy_from_slice(self.proof.as_bytes());
        bytes
    }

    /// Parse from bytes
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVersion` for a foreign version and
    /// `MalformedMessage` for a wrong length, type or status.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_header(data, MessageType::ProofResponse)?;
        if data.len() != PROOF_RESPONSE_SIZE {
            return Err(Error::MalformedMessage);
        }
        Ok(Self {
            status: ProofStatus::try_from(data[2])?,
            nonce: SessionNonce::from_slice(&data[3..19]).ok_or(Error::MalformedMessage)?,
            proof: Proof::from_slice(&data[19..51]).ok_or(Error::MalformedMessage)?,
        })
    }
}

// ============================================================================
// Authentication Result
// ============================================================================

/// Final binary decision sent to the device
///
/// Layout: `[ver][type][nonce:16][accepted:1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResult {
    /// Session nonce
    pub nonce: SessionNonce,
    /// Whether the device was authenticated
    pub accepted: bool,
}

impl AuthResult {
    /// Serialize to bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; AUTH_RESULT_SIZE] {
        let mut bytes = [0u8; AUTH_RESULT_SIZE];
        bytes[0] = PROTOCOL_VERSION;
        bytes[1] = MessageType::AuthResult as u8;
        bytes[2..18].copy_from_slice(self.nonce.as_bytes());
        bytes[18] = u8::from(self.accepted);
        bytes
    }

    /// Parse from bytes
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVersion` for a foreign version and
    /// `MalformedMessage` for a wrong length, type or flag value.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_header(data, MessageType::AuthResult)?;
        if data.len() != AUTH_RESULT_SIZE {
            return Err(Error::MalformedMessage);
        }
        let accepted = match data[18] {
            0 => false,
            1 => true,
            _ => return Err(Error::MalformedMessage),
        };
        Ok(Self {
            nonce: SessionNonce::from_slice(&data[2..18]).ok_or(Error::MalformedMessage)?,
            accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_response_layout() {
        let msg = ProofResponse::with_proof(SessionNonce::new([7; 16]), Proof::new([9; 32]));
        let bytes = msg.to_bytes();
        assert_eq!(&bytes[..3], &[PROTOCOL_VERSION, 0x02, 0x00]);
        assert_eq!(ProofResponse::from_bytes(&bytes).unwrap(), msg);

        let failed = ProofResponse::regeneration_failed(SessionNonce::new([7; 16])).to_bytes();
        assert_eq!(failed[2], 0x01);
        assert!(failed[19..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_auth_result_flag_validated() {
        let mut bytes = AuthResult {
            nonce: SessionNonce::new([1; 16]),
            accepted: true,
        }
        .to_bytes();
        assert_eq!(bytes[18], 1);
        bytes[18] = 2;
        assert_eq!(
            AuthResult::from_bytes(&bytes).unwrap_err(),
            Error::MalformedMessage
        );
    }

    #[test]
    fn test_header_checks() {
        let mut bytes = ProofResponse::regeneration_failed(SessionNonce::default()).to_bytes();
        bytes[0] = 2;
        assert_eq!(
            ProofResponse::from_bytes(&bytes).unwrap_err(),
            Error::UnsupportedVersion
        );
        bytes[0] = PROTOCOL_VERSION;
        assert_eq!(
            AuthResult::from_bytes(&bytes).unwrap_err(),
            Error::MalformedMessage
        );
        assert_eq!(message_type(&bytes).unwrap(), MessageType::ProofResponse);
        assert_eq!(message_type(&[1]).unwrap_err(), Error::MalformedMessage);
        assert_eq!(
            message_type(&[PROTOCOL_VERSION, 0x7F]).unwrap_err(),
            Error::MalformedMessage
        );
    }

    #[test]
    fn test_bad_status_rejected() {
        let mut bytes = ProofResponse::regeneration_failed(SessionNonce::default()).to_bytes();
        bytes[2] = 0x05;
        assert_eq!(
            ProofResponse::from_bytes(&bytes).unwrap_err(),
            Error::MalformedMessage
        );
    }
}

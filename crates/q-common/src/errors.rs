// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for PUF authentication
//!
//! This module defines the unified error type used throughout the workspace.
//! All errors are no_std compatible, `Copy`, and carry a stable 16-bit code
//! so they can be reported over constrained channels without heap allocation.
//!
//! # Propagation
//!
//! Only the binary accept/reject decision crosses the verifier boundary.
//! Error variants never carry distance metrics, bit positions or other
//! partial information about a response or key.

use core::fmt;

/// Result type alias for PUF authentication operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type
///
/// Variants are grouped by category; the high byte of [`Error::code`]
/// identifies the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Cryptographic Errors (0x01xx)
    // =========================================================================
    /// Random number generator failure
    RngFailure,
    /// Key derivation failed
    KeyDerivationFailed,

    // =========================================================================
    // Fuzzy Extraction Errors (0x02xx)
    // =========================================================================
    /// More bit errors than the code can correct (expected under noise)
    CorrectionFailed,
    /// Code parameters outside the supported range
    InvalidCodeParameters,
    /// Helper data does not belong to this code parameterization
    HelperDataMismatch,
    /// Response length differs from the code block length
    ResponseLengthMismatch,

    // =========================================================================
    // Store Errors (0x03xx)
    // =========================================================================
    /// A record already exists for this (device, challenge) pair
    DuplicateChallenge,
    /// No record exists for this (device, challenge) pair
    UnknownChallenge,
    /// Storage is full
    StorageFull,
    /// Storage data is corrupted
    StorageCorrupted,
    /// Storage read operation failed
    StorageReadFailed,
    /// Storage write operation failed
    StorageWriteFailed,

    // =========================================================================
    // Device Errors (0x04xx)
    // =========================================================================
    /// Regeneration failed after exhausting the retry budget
    RegenerationFailed,
    /// PUF measurement failed
    PufError,
    /// PUF is not available
    PufNotAvailable,
    /// Request addressed to a different device
    DeviceMismatch,

    // =========================================================================
    // Protocol Errors (0x05xx)
    // =========================================================================
    /// Proof does not match the expected value
    VerificationMismatch,
    /// Session deadline elapsed
    TimedOut,
    /// Session is unknown or in the wrong state
    InvalidSession,
    /// Nonce belongs to a session that already terminated
    StaleNonce,
    /// A session is already in flight for this (device, challenge) pair
    SessionInFlight,
    /// Session table has no free slot
    SessionTableFull,
    /// Device is rate limited after repeated mismatches
    RateLimited,
    /// Message could not be decoded
    MalformedMessage,
    /// Message version is not supported
    UnsupportedVersion,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Buffer too small
    BufferTooSmall,
    /// Invalid parameter
    InvalidParameter,
    /// Invalid state for operation
    InvalidState,
    /// Requested item not found
    NotFound,
    /// Internal error (should not happen)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Cryptographic errors (0x01xx)
            Self::RngFailure => 0x0101,
            Self::KeyDerivationFailed => 0x0102,

            // Fuzzy extraction errors (0x02xx)
            Self::CorrectionFailed => 0x0201,
            Self::InvalidCodeParameters => 0x0202,
            Self::HelperDataMismatch => 0x0203,
            Self::ResponseLengthMismatch => 0x0204,

            // Store errors (0x03xx)
            Self::DuplicateChallenge => 0x0301,
            Self::UnknownChallenge => 0x0302,
            Self::StorageFull => 0x0303,
            Self::StorageCorrupted => 0x0304,
            Self::StorageReadFailed => 0x0305,
            Self::StorageWriteFailed => 0x0306,

            // Device errors (0x04xx)
            Self::RegenerationFailed => 0x0401,
            Self::PufError => 0x0402,
            Self::PufNotAvailable => 0x0403,
            Self::DeviceMismatch => 0x0404,

            // Protocol errors (0x05xx)
            Self::VerificationMismatch => 0x0501,
            Self::TimedOut => 0x0502,
            Self::InvalidSession => 0x0503,
            Self::StaleNonce => 0x0504,
            Self::SessionInFlight => 0x0505,
            Self::SessionTableFull => 0x0506,
            Self::RateLimited => 0x0507,
            Self::MalformedMessage => 0x0508,
            Self::UnsupportedVersion => 0x0509,

            // General errors (0xFFxx)
            Self::BufferTooSmall => 0xFF01,
            Self::InvalidParameter => 0xFF02,
            Self::InvalidState => 0xFF03,
            Self::NotFound => 0xFF04,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-relevant error
    ///
    /// Security errors are logged in the security category and count toward
    /// mismatch rate limiting. `TimedOut` is an availability event and is not
    /// included.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::VerificationMismatch
                | Self::StaleNonce
                | Self::RegenerationFailed
                | Self::DeviceMismatch
                | Self::StorageCorrupted
                | Self::RateLimited
        )
    }

    /// Check if the operation may succeed when retried with a fresh measurement
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::CorrectionFailed)
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::RngFailure => "RNG failure",
            Self::KeyDerivationFailed => "key derivation failed",
            Self::CorrectionFailed => "error correction failed",
            Self::InvalidCodeParameters => "invalid code parameters",
            Self::HelperDataMismatch => "helper data mismatch",
            Self::ResponseLengthMismatch => "response length mismatch",
            Self::DuplicateChallenge => "duplicate challenge",
            Self::UnknownChallenge => "unknown challenge",
            Self::StorageFull => "storage full",
            Self::StorageCorrupted => "storage corrupted",
            Self::StorageReadFailed => "storage read failed",
            Self::StorageWriteFailed => "storage write failed",
            Self::RegenerationFailed => "regeneration failed",
            Self::PufError => "PUF error",
            Self::PufNotAvailable => "PUF not available",
            Self::DeviceMismatch => "device mismatch",
            Self::VerificationMismatch => "verification mismatch",
            Self::TimedOut => "session timed out",
            Self::InvalidSession => "invalid session",
            Self::StaleNonce => "stale nonce",
            Self::SessionInFlight => "session already in flight",
            Self::SessionTableFull => "session table full",
            Self::RateLimited => "rate limited",
            Self::MalformedMessage => "malformed message",
            Self::UnsupportedVersion => "unsupported version",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidState => "invalid state",
            Self::NotFound => "not found",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_grouped_by_category() {
        assert_eq!(Error::CorrectionFailed.code() >> 8, 0x02);
        assert_eq!(Error::DuplicateChallenge.code() >> 8, 0x03);
        assert_eq!(Error::RegenerationFailed.code() >> 8, 0x04);
        assert_eq!(Error::TimedOut.code() >> 8, 0x05);
    }

    #[test]
    fn test_timeout_is_not_security_event() {
        assert!(!Error::TimedOut.is_security_error());
        assert!(Error::VerificationMismatch.is_security_error());
    }

    #[test]
    fn test_only_correction_failure_is_recoverable() {
        assert!(Error::CorrectionFailed.is_recoverable());
        assert!(!Error::RegenerationFailed.is_recoverable());
        assert!(!Error::UnknownChallenge.is_recoverable());
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Cryptographic error types
//!
//! This module defines error types for hashing, key derivation and random
//! number generation.

use core::fmt;

/// Error type for cryptographic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Random number generator failure
    RngFailure,
    /// Buffer is too small for the operation
    BufferTooSmall,
    /// Key derivation failed
    KeyDerivationFailed,
    /// Context string exceeds the supported length
    ContextTooLong,
}

impl CryptoError {
    /// Get error code for logging/debugging
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::RngFailure => 0x0101,
            Self::KeyDerivationFailed => 0x0102,
            Self::BufferTooSmall => 0x0103,
            Self::ContextTooLong => 0x0104,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::RngFailure => "RNG failure",
            Self::BufferTooSmall => "buffer too small",
            Self::KeyDerivationFailed => "key derivation failed",
            Self::ContextTooLong => "derivation context too long",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

impl From<CryptoError> for q_common::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::RngFailure => Self::RngFailure,
            CryptoError::BufferTooSmall => Self::BufferTooSmall,
            CryptoError::KeyDerivationFailed | CryptoError::ContextTooLong => {
                Self::KeyDerivationFailed
            }
        }
    }
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

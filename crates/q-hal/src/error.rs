// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL error types

use core::fmt;

/// HAL error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// PUF powered down or not present
    PufNotAvailable,
    /// PUF returned no usable measurement
    MeasurementFailed,
    /// Storage slot index beyond the device
    SlotOutOfRange,
    /// Storage slot never written or erased
    SlotEmpty,
    /// Storage backend rejected the write
    StorageWriteFailed,
    /// Entropy source not ready or failed
    RngError,
    /// Invalid parameter
    InvalidParameter,
    /// Buffer too small for the data
    BufferTooSmall,
}

impl HalError {
    /// Get error code
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::PufNotAvailable => 0x08B1,
            Self::MeasurementFailed => 0x08B2,
            Self::SlotOutOfRange => 0x0891,
            Self::SlotEmpty => 0x0892,
            Self::StorageWriteFailed => 0x0893,
            Self::RngError => 0x0820,
            Self::InvalidParameter => 0x08F0,
            Self::BufferTooSmall => 0x08F1,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::PufNotAvailable => "PUF not available",
            Self::MeasurementFailed => "PUF measurement failed",
            Self::SlotOutOfRange => "storage slot out of range",
            Self::SlotEmpty => "storage slot empty",
            Self::StorageWriteFailed => "storage write failed",
            Self::RngError => "RNG error",
            Self::InvalidParameter => "invalid parameter",
            Self::BufferTooSmall => "buffer too small",
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

impl From<HalError> for q_common::Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::PufNotAvailable => Self::PufNotAvailable,
            HalError::MeasurementFailed => Self::PufError,
            HalError::SlotOutOfRange => Self::StorageReadFailed,
            HalError::SlotEmpty => Self::NotFound,
            HalError::StorageWriteFailed => Self::StorageWriteFailed,
            HalError::RngError => Self::RngFailure,
            HalError::InvalidParameter => Self::InvalidParameter,
            HalError::BufferTooSmall => Self::BufferTooSmall,
        }
    }
}

/// HAL Result type
pub type HalResult<T> = Result<T, HalError>;

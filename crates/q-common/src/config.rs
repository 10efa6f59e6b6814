// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! System configuration
//!
//! This module defines configuration structures that control code
//! parameters, enrollment, regeneration retries and protocol deadlines.
//! Configuration is const-constructible and provisioned with the device or
//! verifier; call [`SystemConfig::validate`] before use.

use crate::constants::{
    MAX_CORRECTION_RADIUS, MAX_FIELD_DEGREE, MAX_REFERENCE_CAPTURES, MAX_REGENERATION_ATTEMPTS,
    MAX_SESSIONS, MIN_FIELD_DEGREE,
};
use crate::errors::{Error, Result};
use crate::time::Millis;

/// System-wide configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemConfig {
    /// Error-correcting code parameters
    pub code: CodeConfig,
    /// Enrollment configuration
    pub enrollment: EnrollmentConfig,
    /// Device regeneration configuration
    pub regeneration: RegenerationConfig,
    /// Protocol configuration
    pub protocol: ProtocolConfig,
}

impl SystemConfig {
    /// Default configuration
    pub const DEFAULT: Self = Self {
        code: CodeConfig::DEFAULT,
        enrollment: EnrollmentConfig::DEFAULT,
        regeneration: RegenerationConfig::DEFAULT,
        protocol: ProtocolConfig::DEFAULT,
    };

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first section's validation error.
    pub fn validate(&self) -> Result<()> {
        self.code.validate()?;
        self.enrollment.validate()?;
        self.regeneration.validate()?;
        self.protocol.validate()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Binary BCH code parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeConfig {
    /// Field degree `m` of GF(2^m)
    pub field_degree: u8,
    /// Block length `n` in bits (equals the PUF response length)
    pub block_length: u16,
    /// Correction radius `t`
    pub correction_radius: u8,
}

impl CodeConfig {
    /// BCH(255, t=16) over GF(2^8)
    pub const DEFAULT: Self = Self {
        field_degree: 8,
        block_length: 255,
        correction_radius: 16,
    };

    /// Create code parameters
    #[must_use]
    pub const fn new(field_degree: u8, block_length: u16, correction_radius: u8) -> Self {
        Self {
            field_degree,
            block_length,
            correction_radius,
        }
    }

    /// Number of non-zero field elements, `2^m - 1`
    #[must_use]
    pub const fn field_order(&self) -> usize {
        (1usize << self.field_degree) - 1
    }

    /// Helper data leakage bound in bits (`t * m`)
    #[must_use]
    pub const fn leakage_bits(&self) -> usize {
        self.correction_radius as usize * self.field_degree as usize
    }

    /// Validate the parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidCodeParameters` unless `5 <= m <= 10`,
    /// `1 <= t <= 64` and `2t < n <= 2^m - 1`.
    pub fn validate(&self) -> Result<()> {
        if self.field_degree < MIN_FIELD_DEGREE || self.field_degree > MAX_FIELD_DEGREE {
            return Err(Error::InvalidCodeParameters);
        }
        if self.correction_radius == 0 || self.correction_radius > MAX_CORRECTION_RADIUS {
            return Err(Error::InvalidCodeParameters);
        }
        let n = self.block_length as usize;
        if n > self.field_order() || n <= 2 * self.correction_radius as usize {
            return Err(Error::InvalidCodeParameters);
        }
        Ok(())
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What to do when enrolling a pair that already has a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwritePolicy {
    /// Fail with `DuplicateChallenge`
    Reject,
    /// Replace the existing record
    Overwrite,
}

/// Enrollment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentConfig {
    /// Number of captures combined by majority vote (odd)
    pub reference_captures: u8,
    /// Policy for existing records
    pub overwrite: OverwritePolicy,
}

impl EnrollmentConfig {
    /// Single capture, reject duplicates
    pub const DEFAULT: Self = Self {
        reference_captures: 1,
        overwrite: OverwritePolicy::Reject,
    };

    /// Validate the parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an even or out-of-range capture count.
    pub fn validate(&self) -> Result<()> {
        if self.reference_captures == 0
            || self.reference_captures > MAX_REFERENCE_CAPTURES
            || self.reference_captures % 2 == 0
        {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Device regeneration configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationConfig {
    /// Measurements attempted before reporting `RegenerationFailed`
    pub max_attempts: u8,
}

impl RegenerationConfig {
    /// Three attempts
    pub const DEFAULT: Self = Self { max_attempts: 3 };

    /// Validate the parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` unless `1 <= max_attempts <= 8`.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 || self.max_attempts > MAX_REGENERATION_ATTEMPTS {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Verifier protocol configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Deadline from issue to proof
    pub session_timeout: Millis,
    /// Maximum concurrently tracked sessions
    pub max_sessions: u8,
    /// Mismatches tolerated per device before rate limiting
    pub mismatch_burst: u8,
    /// Time to regain one tolerated mismatch
    pub mismatch_refill: Millis,
}

impl ProtocolConfig {
    /// 5 s deadline, 16 sessions, 5 mismatches per minute
    pub const DEFAULT: Self = Self {
        session_timeout: Millis::from_secs(5),
        max_sessions: 16,
        mismatch_burst: 5,
        mismatch_refill: Millis::from_secs(60),
    };

    /// Validate the parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero timeout, an empty or oversized
    /// session table, or a zero mismatch burst or refill interval.
    pub fn validate(&self) -> Result<()> {
        if self.session_timeout == Millis::ZERO
            || self.max_sessions == 0
            || self.max_sessions as usize > MAX_SESSIONS
            || self.mismatch_burst == 0
            || self.mismatch_refill == Millis::ZERO
        {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

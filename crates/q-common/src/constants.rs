// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! System-wide constants
//!
//! Compile-time limits for response vectors, code parameters, key material
//! and protocol tables. All buffers in the workspace are sized from these.

// =============================================================================
// PUF Response Constants
// =============================================================================

/// Largest supported field degree `m` for GF(2^m)
pub const MAX_FIELD_DEGREE: u8 = 10;

/// Smallest supported field degree `m` for GF(2^m)
pub const MIN_FIELD_DEGREE: u8 = 5;

/// Maximum response length in bits (2^MAX_FIELD_DEGREE - 1)
pub const MAX_RESPONSE_BITS: usize = (1 << MAX_FIELD_DEGREE) - 1;

/// Maximum response length in bytes
pub const MAX_RESPONSE_BYTES: usize = (MAX_RESPONSE_BITS + 7) / 8;

/// Maximum correction radius `t`
pub const MAX_CORRECTION_RADIUS: u8 = 64;

// =============================================================================
// Cryptographic Constants
// =============================================================================

/// SHA3-256 output size in bytes
pub const SHA3_256_OUTPUT_SIZE: usize = 32;

/// Derived key size in bytes
pub const DERIVED_KEY_SIZE: usize = 32;

/// Helper data check tag size in bytes
pub const HELPER_CHECK_SIZE: usize = 16;

/// Maximum serialized helper data size in bytes
pub const MAX_HELPER_DATA_SIZE: usize = 5 + 2 * MAX_CORRECTION_RADIUS as usize + HELPER_CHECK_SIZE;

// =============================================================================
// Protocol Constants
// =============================================================================

/// Current wire and record format version
pub const PROTOCOL_VERSION: u8 = 1;

/// Upper bound on concurrently tracked verifier sessions
pub const MAX_SESSIONS: usize = 32;

/// Upper bound on devices tracked by the mismatch limiter
pub const MAX_LIMITED_DEVICES: usize = 32;

/// Hard cap on device-side regeneration attempts
pub const MAX_REGENERATION_ATTEMPTS: u8 = 8;

/// Maximum reference captures combined at enrollment
pub const MAX_REFERENCE_CAPTURES: u8 = 15;

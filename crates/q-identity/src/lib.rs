// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! PUF Identity: Enrollment, Regeneration and Verification
//!
//! This crate manages the enrolled identity of PUF devices:
//!
//! - **Enrollment**: reference capture, helper data, key commitment
//! - **Regeneration**: device-side key reconstruction with bounded retry
//! - **Verification**: verifier-side proof check against the commitment
//! - **Storage**: records keyed by `(device, challenge)`
//! - **Lifecycle**: de-provisioning and challenge rotation
//!
//! # Architecture
//!
//! ```text
//!            enrollment (once)                     authentication (each session)
//! ┌───────────────────────────────┐        ┌───────────────────────────────────┐
//! │ PUF ─► ECC.encode ─► KDF ─► C │        │ device:   PUF + helper ─► K ─► P  │
//! │            │               │  │        │ verifier: C + nonce ─────────► P' │
//! │         helper             │  │        │           P == P' (const time)    │
//! └────────────┼───────────────┼──┘        └───────────────────────────────────┘
//!              ▼               ▼
//!      ┌───────────────────────────────┐
//!      │ EnrollmentRecord (dev, chal)  │
//!      └───────────────────────────────┘
//! ```
//!
//! The raw response and derived key exist only inside [`EnrollmentEngine`]
//! and [`DeviceRegenerator`], in zeroize-on-drop buffers.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod enrollment;
pub mod lifecycle;
pub mod record;
pub mod regeneration;
pub mod storage;
pub mod verification;

// Re-exports
pub use enrollment::EnrollmentEngine;
pub use lifecycle::{deprovision_device, rotate_challenge};
pub use record::EnrollmentRecord;
pub use regeneration::{DeviceRegenerator, RetryBudget};
pub use storage::{ChallengeResponseStore, MemoryStore, SlotStore};
pub use verification::{Verdict, VerifierRegenerator};

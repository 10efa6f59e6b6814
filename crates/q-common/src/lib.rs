// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! PUF Authentication Common Library
//!
//! This crate provides common types, error definitions, configuration
//! structures and utilities shared by the enrollment, regeneration and
//! protocol crates.
//!
//! # Features
//!
//! - `std`: Enable standard library support (disabled by default for embedded)
//! - `defmt`: Enable defmt logging support for embedded debugging
//!
//! # Security
//!
//! Secret-bearing types (`ResponseBits`) zeroize on drop. Proofs and
//! commitments compare in constant time and never print their contents.
//! No heap allocations are performed - all buffers use fixed-size arrays or
//! heapless collections.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod bits;
pub mod config;
pub mod constants;
pub mod errors;
pub mod log;
pub mod time;
pub mod types;

// Re-export commonly used items
pub use bits::ResponseBits;
pub use config::{
    CodeConfig, EnrollmentConfig, OverwritePolicy, ProtocolConfig, RegenerationConfig,
    SystemConfig,
};
pub use errors::{Error, Result};
pub use log::{EventCategory, LogBuffer, LogLevel};
pub use time::{Deadline, Millis, Ticks};
pub use types::*;

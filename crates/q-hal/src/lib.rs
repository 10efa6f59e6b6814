// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware Abstraction Layer for PUF Authentication
//!
//! This crate defines the narrow interfaces through which the
//! authentication core reaches hardware:
//!
//! - [`PufInterface`]: fixed-length noisy response for a challenge
//! - [`SecureStorageInterface`]: slot-based persistent storage
//! - [`RngInterface`]: hardware entropy for seeding the nonce DRBG
//!
//! With the `sim` feature (default) it also provides host simulators:
//! a seeded noisy PUF, RAM-backed slot storage and a seeded entropy source.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod traits;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export main traits
pub use error::{HalError, HalResult};
pub use traits::*;

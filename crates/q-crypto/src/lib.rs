// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! PUF Authentication Cryptographic Layer
//!
//! This crate provides the cryptographic foundation for PUF-based
//! authentication:
//!
//! - **Hashing**: SHA3-256
//! - **Key derivation**: HMAC-SHA3-256 and HKDF-SHA3-256 behind the [`Kdf`] trait
//! - **Key schedule**: enrollment key, one-way commitment and session-bound
//!   proofs ([`kdf::PufKdf`])
//! - **Randomness**: SHA3-256 Hash_DRBG with entropy health tests
//!   ([`drbg::SystemRng`]) for session nonces, plus a seeded counter-mode
//!   generator for host tooling
//!
//! # Security Requirements
//!
//! All cryptographic operations in this crate:
//! - Compare secret-dependent values in constant time
//! - Zeroize sensitive data after use
//! - Never log or expose key material

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod drbg;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod rng;
pub mod traits;

pub use drbg::{EntropyHealthTest, HashDrbg, SystemRng};
pub use error::{CryptoError, CryptoResult};
pub use hash::{HkdfSha3_256, HmacSha3_256, Sha3_256};
pub use kdf::{DerivedKey, PufKdf, SessionKey};
pub use rng::SimpleRng;
#[cfg(any(test, feature = "test-vectors"))]
pub use rng::TestRng;
pub use traits::{constant_time_eq, CryptoRng, EntropySource, Hash, Kdf};

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Fuzzy Extraction for PUF Responses
//!
//! This crate turns noisy PUF measurements back into the exact response that
//! was captured at enrollment:
//!
//! - **GF(2^m)**: table-driven field arithmetic for `5 <= m <= 10`
//! - **BCH decoder**: syndromes, Berlekamp-Massey, Chien search
//! - **Secure sketch**: helper data publishing `t * m` bits of syndrome
//!   plus a check tag that rejects miscorrections
//!
//! # Example
//!
//! ```rust,ignore
//! use q_fuzzy::{BchSketch, ErrorCorrectingCode};
//! use q_common::CodeConfig;
//!
//! let sketch = BchSketch::new(CodeConfig::DEFAULT)?;
//! let (codeword, helper) = sketch.encode(&reference)?;
//! let recovered = sketch.decode(&noisy, &helper)?;
//! assert_eq!(recovered, codeword);
//! ```

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

pub mod bch;
pub mod gf;
pub mod sketch;

pub use bch::BchDecoder;
pub use gf::GaloisField;
pub use sketch::{majority_vote, BchSketch, Codeword, ErrorCorrectingCode, HelperBytes, HelperData};

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Host simulators for the hardware collaborators
//!
//! Used by tests and host-side tooling where no PUF silicon is present.

mod puf;
mod rng;
mod storage;

pub use puf::{NoiseModel, SimulatedPuf};
pub use rng::SimulatedTrng;
pub use storage::MemorySecureStorage;

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware abstraction traits
//!
//! The PUF measurement source, the slot-based secure storage and the
//! hardware entropy source are the only hardware collaborators of the
//! authentication core. Their calls may block; everything above them is pure
//! computation.

use crate::error::HalResult;
use q_common::{ChallengeId, ResponseBits};

/// Slot-based secure storage interface
pub trait SecureStorageInterface {
    /// Maximum data size per slot
    const MAX_SLOT_SIZE: usize;

    /// Number of available slots
    const NUM_SLOTS: usize;

    /// Read data from a slot
    ///
    /// Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns `SlotEmpty` for an empty slot and
    /// `BufferTooSmall` if `buffer` cannot hold the slot contents.
    fn read(&self, slot: u8, buffer: &mut [u8]) -> HalResult<usize>;

    /// Write data to a slot, replacing any previous contents
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `data` exceeds `MAX_SLOT_SIZE`.
    fn write(&mut self, slot: u8, data: &[u8]) -> HalResult<()>;

    /// Erase a slot
    ///
    /// # Errors
    ///
    /// Returns `SlotOutOfRange` for an invalid slot.
    fn erase(&mut self, slot: u8) -> HalResult<()>;

    /// Check if a slot has been written
    ///
    /// # Errors
    ///
    /// Returns `SlotOutOfRange` for an invalid slot.
    fn is_slot_written(&self, slot: u8) -> HalResult<bool>;
}

/// PUF (Physically Unclonable Function) measurement source
///
/// Each call to [`PufInterface::measure`] yields an independent noise
/// realization of the device's response to `challenge`. Measuring has no
/// side effect on the device secret.
pub trait PufInterface {
    /// Response length in bits
    fn response_bits(&self) -> usize;

    /// Check if PUF is available
    fn is_available(&self) -> bool;

    /// Measure the response to `challenge` into `response`
    ///
    /// `response` must already have length [`PufInterface::response_bits`].
    ///
    /// # Errors
    ///
    /// Returns `PufNotAvailable` if the PUF cannot be read and
    /// `InvalidParameter` if `response` has the wrong length.
    fn measure(&mut self, challenge: ChallengeId, response: &mut ResponseBits) -> HalResult<()>;
}

impl<P: PufInterface + ?Sized> PufInterface for &mut P {
    fn response_bits(&self) -> usize {
        (**self).response_bits()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn measure(&mut self, challenge: ChallengeId, response: &mut ResponseBits) -> HalResult<()> {
        (**self).measure(challenge, response)
    }
}

/// Hardware entropy source
///
/// Output is raw conditioned entropy used to seed and reseed the verifier's
/// DRBG. It is never used directly as nonce material.
pub trait RngInterface {
    /// Bring the source up
    ///
    /// # Errors
    ///
    /// Returns `RngError` if the source cannot start.
    fn init(&mut self) -> HalResult<()>;

    /// Fill `buffer` with entropy
    ///
    /// # Errors
    ///
    /// Returns `RngError` if the source is not ready or reports a fault.
    fn fill_bytes(&mut self, buffer: &mut [u8]) -> HalResult<()>;

    /// Check if the source is ready
    fn is_ready(&self) -> bool;
}

impl<R: RngInterface + ?Sized> RngInterface for &mut R {
    fn init(&mut self) -> HalResult<()> {
        (**self).init()
    }

    fn fill_bytes(&mut self, buffer: &mut [u8]) -> HalResult<()> {
        (**self).fill_bytes(buffer)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

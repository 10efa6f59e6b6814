// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! RAM-backed slot storage

use crate::error::{HalError, HalResult};
use crate::traits::SecureStorageInterface;

/// In-memory implementation of [`SecureStorageInterface`]
pub struct MemorySecureStorage<const SLOTS: usize, const SIZE: usize> {
    data: [[u8; SIZE]; SLOTS],
    lens: [Option<usize>; SLOTS],
    fail_writes: bool,
}

impl<const SLOTS: usize, const SIZE: usize> MemorySecureStorage<SLOTS, SIZE> {
    /// Create empty storage
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: [[0u8; SIZE]; SLOTS],
            lens: [None; SLOTS],
            fail_writes: false,
        }
    }

    /// Make subsequent writes fail (fault injection)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of written slots
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.lens.iter().filter(|l| l.is_some()).count()
    }

    fn index(slot: u8) -> HalResult<usize> {
        let idx = usize::from(slot);
        if idx >= SLOTS {
            return Err(HalError::SlotOutOfRange);
        }
        Ok(idx)
    }
}

impl<const SLOTS: usize, const SIZE: usize> Default for MemorySecureStorage<SLOTS, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SLOTS: usize, const SIZE: usize> SecureStorageInterface
    for MemorySecureStorage<SLOTS, SIZE>
{
    const MAX_SLOT_SIZE: usize = SIZE;
    const NUM_SLOTS: usize = SLOTS;

    fn read(&self, slot: u8, buffer: &mut [u8]) -> HalResult<usize> {
        let idx = Self::index(slot)?;
        let len = self.lens[idx].ok_or(HalError::SlotEmpty)?;
        if buffer.len() < len {
            return Err(HalError::BufferTooSmall);
        }
        buffer[..len].copy_from_slice(&self.data[idx][..len]);
        Ok(len)
    }

    fn write(&mut self, slot: u8, data: &[u8]) -> HalResult<()> {
        let idx = Self::index(slot)?;
        if data.len() > SIZE {
            return Err(HalError::InvalidParameter);
        }
        if self.fail_writes {
            return Err(HalError::StorageWriteFailed);
        }
        self.data[idx] = [0u8; SIZE];
        self.data[idx][..data.len()].copy_from_slice(data);
        self.lens[idx] = Some(data.len());
        Ok(())
    }

    fn erase(&mut self, slot: u8) -> HalResult<()> {
        let idx = Self::index(slot)?;
        self.data[idx] = [0u8; SIZE];
        self.lens[idx] = None;
        Ok(())
    }

    fn is_slot_written(&self, slot: u8) -> HalResult<bool> {
        Ok(self.lens[Self::index(slot)?].is_some())
    }
}

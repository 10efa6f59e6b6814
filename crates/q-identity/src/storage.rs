// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Enrollment record storage
//!
//! [`ChallengeResponseStore`] is keyed by `(device, challenge)` and holds at
//! most one record per key. Two implementations are provided: a RAM table
//! for verifiers and tests, and a slot-backed store over
//! [`SecureStorageInterface`] using the persisted record layout.

use core::cell::{Ref, RefCell};

use heapless::Vec;
use q_common::{
    log_warn, ChallengeId, DeviceId, Error, EventCategory, LogBuffer, OverwritePolicy, Result,
};
use q_hal::{HalError, SecureStorageInterface};

use crate::record::EnrollmentRecord;

const MODULE: &str = "slot-store";

/// Store of enrollment records keyed by `(device, challenge)`
pub trait ChallengeResponseStore {
    /// Insert a record
    ///
    /// # Errors
    ///
    /// Returns `DuplicateChallenge` if a record exists and `policy` is
    /// [`OverwritePolicy::Reject`], `StorageFull` if there is no room.
    fn put(&mut self, record: EnrollmentRecord, policy: OverwritePolicy) -> Result<()>;

    /// Fetch the record for `(device, challenge)`
    ///
    /// # Errors
    ///
    /// Returns `UnknownChallenge` if no record exists.
    fn get(&self, device: &DeviceId, challenge: ChallengeId) -> Result<EnrollmentRecord>;

    /// Whether a record exists for `(device, challenge)`
    ///
    /// # Errors
    ///
    /// Propagates backend read failures.
    fn contains(&self, device: &DeviceId, challenge: ChallengeId) -> Result<bool>;

    /// Remove the record for `(device, challenge)`
    ///
    /// # Errors
    ///
    /// Returns `UnknownChallenge` if no record exists.
    fn remove(&mut self, device: &DeviceId, challenge: ChallengeId) -> Result<()>;

    /// Remove every record of `device`, returning how many were removed
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    fn remove_device(&mut self, device: &DeviceId) -> Result<usize>;

    /// Number of stored records
    fn len(&self) -> usize;

    /// Whether the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ChallengeResponseStore + ?Sized> ChallengeResponseStore for &mut S {
    fn put(&mut self, record: EnrollmentRecord, policy: OverwritePolicy) -> Result<()> {
        (**self).put(record, policy)
    }

    fn get(&self, device: &DeviceId, challenge: ChallengeId) -> Result<EnrollmentRecord> {
        (**self).get(device, challenge)
    }

    fn contains(&self, device: &DeviceId, challenge: ChallengeId) -> Result<bool> {
        (**self).contains(device, challenge)
    }

    fn remove(&mut self, device: &DeviceId, challenge: ChallengeId) -> Result<()> {
        (**self).remove(device, challenge)
    }

    fn remove_device(&mut self, device: &DeviceId) -> Result<usize> {
        (**self).remove_device(device)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Fixed-capacity in-memory store
pub struct MemoryStore<const N: usize> {
    records: Vec<EnrollmentRecord, N>,
}

impl<const N: usize> MemoryStore<N> {
    /// Create an empty store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Iterate over all records
    pub fn iter(&self) -> impl Iterator<Item = &EnrollmentRecord> {
        self.records.iter()
    }

    fn position(&self, device: &DeviceId, challenge: ChallengeId) -> Option<usize> {
        self.records.iter().position(|r| r.matches(device, challenge))
    }
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChallengeResponseStore for MemoryStore<N> {
    fn put(&mut self, record: EnrollmentRecord, policy: OverwritePolicy) -> Result<()> {
        match (self.position(&record.device_id, record.challenge_id), policy) {
            (Some(_), OverwritePolicy::Reject) => Err(Error::DuplicateChallenge),
            (Some(index), OverwritePolicy::Overwrite) => {
                self.records[index] = record;
                Ok(())
            }
            (None, _) => self.records.push(record).map_err(|_| Error::StorageFull),
        }
    }

    fn get(&self, device: &DeviceId, challenge: ChallengeId) -> Result<EnrollmentRecord> {
        self.position(device, challenge)
            .map(|index| self.records[index].clone())
            .ok_or(Error::UnknownChallenge)
    }

    fn contains(&self, device: &DeviceId, challenge: ChallengeId) -> Result<bool> {
        Ok(self.position(device, challenge).is_some())
    }

    fn remove(&mut self, device: &DeviceId, challenge: ChallengeId) -> Result<()> {
        let index = self
            .position(device, challenge)
            .ok_or(Error::UnknownChallenge)?;
        self.records.swap_remove(index);
        Ok(())
    }

    fn remove_device(&mut self, device: &DeviceId) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|r| r.device_id != *device);
        Ok(before - self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

// =============================================================================
// Slot-backed store
// =============================================================================

/// Contents of one storage slot
enum Slot {
    Empty,
    Record(EnrollmentRecord),
    /// Unparseable; carries its key when the header survived
    Corrupt(Option<(DeviceId, ChallengeId)>),
}

/// Store persisting one record per secure storage slot
///
/// A damaged slot only affects the key it belongs to. Lookups for other
/// keys skip it and note the skip in [`SlotStore::log`] as an availability
/// event; lookups for its own key fail with `StorageCorrupted`.
pub struct SlotStore<S: SecureStorageInterface> {
    storage: S,
    log: RefCell<LogBuffer>,
}

impl<S: SecureStorageInterface> SlotStore<S> {
    /// Wrap a secure storage backend
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            log: RefCell::new(LogBuffer::new()),
        }
    }

    /// Underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Release the underlying storage
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Skipped-slot log
    ///
    /// Slot scans have no clock, so entries carry timestamp 0.
    pub fn log(&self) -> Ref<'_, LogBuffer> {
        self.log.borrow()
    }

    fn slots() -> impl Iterator<Item = u8> {
        (0..S::NUM_SLOTS.min(usize::from(u8::MAX) + 1)).filter_map(|s| u8::try_from(s).ok())
    }

    fn load(&self, slot: u8) -> Result<Slot> {
        if !self
            .storage
            .is_slot_written(slot)
            .map_err(|_| Error::StorageReadFailed)?
        {
            return Ok(Slot::Empty);
        }

        let mut buffer = [0u8; EnrollmentRecord::MAX_SERIALIZED_SIZE];
        let len = match self.storage.read(slot, &mut buffer) {
            Ok(len) => len,
            Err(HalError::SlotEmpty) => return Ok(Slot::Empty),
            Err(HalError::BufferTooSmall) => return Ok(Slot::Corrupt(None)),
            Err(_) => return Err(Error::StorageReadFailed),
        };
        let bytes = &buffer[..len];
        Ok(match EnrollmentRecord::from_bytes(bytes) {
            Ok(record) => Slot::Record(record),
            Err(_) => Slot::Corrupt(EnrollmentRecord::peek_key(bytes)),
        })
    }

    fn note_skipped(&self, slot: u8) {
        if let Ok(mut log) = self.log.try_borrow_mut() {
            log_warn!(
                log,
                0,
                EventCategory::Availability,
                MODULE,
                "slot {} unreadable, skipped",
                slot
            );
        }
    }

    /// Slot holding `(device, challenge)` and its record, `None` if damaged
    fn locate(
        &self,
        device: &DeviceId,
        challenge: ChallengeId,
    ) -> Result<Option<(u8, Option<EnrollmentRecord>)>> {
        for slot in Self::slots() {
            match self.load(slot)? {
                Slot::Empty => {}
                Slot::Record(record) => {
                    if record.matches(device, challenge) {
                        return Ok(Some((slot, Some(record))));
                    }
                }
                Slot::Corrupt(Some((d, c))) if d == *device && c == challenge => {
                    return Ok(Some((slot, None)));
                }
                Slot::Corrupt(_) => self.note_skipped(slot),
            }
        }
        Ok(None)
    }

    fn free_slot(&self) -> Result<Option<u8>> {
        for slot in Self::slots() {
            if !self
                .storage
                .is_slot_written(slot)
                .map_err(|_| Error::StorageReadFailed)?
            {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }
}

impl<S: SecureStorageInterface> ChallengeResponseStore for SlotStore<S> {
    fn put(&mut self, record: EnrollmentRecord, policy: OverwritePolicy) -> Result<()> {
        let slot = match (self.locate(&record.device_id, record.challenge_id)?, policy) {
            (Some((_, Some(_))), OverwritePolicy::Reject) => return Err(Error::DuplicateChallenge),
            (Some((_, None)), OverwritePolicy::Reject) => return Err(Error::StorageCorrupted),
            // overwriting a damaged record repairs it
            (Some((slot, _)), OverwritePolicy::Overwrite) => slot,
            (None, _) => self.free_slot()?.ok_or(Error::StorageFull)?,
        };

        let mut buffer = [0u8; EnrollmentRecord::MAX_SERIALIZED_SIZE];
        let len = record.to_bytes(&mut buffer)?;
        self.storage
            .write(slot, &buffer[..len])
            .map_err(|_| Error::StorageWriteFailed)
    }

    fn get(&self, device: &DeviceId, challenge: ChallengeId) -> Result<EnrollmentRecord> {
        match self.locate(device, challenge)? {
            Some((_, Some(record))) => Ok(record),
            Some((_, None)) => Err(Error::StorageCorrupted),
            None => Err(Error::UnknownChallenge),
        }
    }

    fn contains(&self, device: &DeviceId, challenge: ChallengeId) -> Result<bool> {
        match self.locate(device, challenge)? {
            Some((_, Some(_))) => Ok(true),
            Some((_, None)) => Err(Error::StorageCorrupted),
            None => Ok(false),
        }
    }

    fn remove(&mut self, device: &DeviceId, challenge: ChallengeId) -> Result<()> {
        let (slot, _) = self
            .locate(device, challenge)?
            .ok_or(Error::UnknownChallenge)?;
        self.storage
            .erase(slot)
            .map_err(|_| Error::StorageWriteFailed)
    }

    fn remove_device(&mut self, device: &DeviceId) -> Result<usize> {
        let mut removed = 0;
        for slot in Self::slots() {
            let owned = match self.load(slot)? {
                Slot::Empty => false,
                Slot::Record(record) => record.device_id == *device,
                Slot::Corrupt(Some((d, _))) if d == *device => true,
                Slot::Corrupt(_) => {
                    self.note_skipped(slot);
                    false
                }
            };
            if owned {
                self.storage
                    .erase(slot)
                    .map_err(|_| Error::StorageWriteFailed)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        Self::slots()
            .filter(|&slot| matches!(self.storage.is_slot_written(slot), Ok(true)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use q_common::{CodeConfig, KeyCommitment, ResponseBits, Timestamp};
    use q_fuzzy::{BchSketch, ErrorCorrectingCode};
    use q_hal::sim::MemorySecureStorage;

    fn record(device: u8, challenge: u32, commitment: u8) -> EnrollmentRecord {
        let sketch = BchSketch::new(CodeConfig::new(6, 63, 4)).unwrap();
        let reference = ResponseBits::from_bytes(&[device ^ 0x3C; 8], 63).unwrap();
        let (_, helper_data) = sketch.encode(&reference).unwrap();
        EnrollmentRecord {
            device_id: DeviceId::new([device; 32]),
            challenge_id: ChallengeId::new(challenge),
            helper_data,
            commitment: KeyCommitment::new([commitment; 32]),
            enrolled_at: Timestamp::new(100),
        }
    }

    fn exercise<S: ChallengeResponseStore>(store: &mut S) {
        let dev = DeviceId::new([1; 32]);
        store.put(record(1, 1, 0xA0), OverwritePolicy::Reject).unwrap();
        store.put(record(1, 2, 0xA1), OverwritePolicy::Reject).unwrap();
        store.put(record(2, 1, 0xB0), OverwritePolicy::Reject).unwrap();
        assert_eq!(store.len(), 3);

        assert_eq!(
            store.put(record(1, 1, 0xFF), OverwritePolicy::Reject),
            Err(Error::DuplicateChallenge)
        );
        assert_eq!(
            store.get(&dev, ChallengeId::new(1)).unwrap().commitment,
            KeyCommitment::new([0xA0; 32])
        );

        store.put(record(1, 1, 0xFF), OverwritePolicy::Overwrite).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.get(&dev, ChallengeId::new(1)).unwrap().commitment,
            KeyCommitment::new([0xFF; 32])
        );

        assert_eq!(
            store.get(&dev, ChallengeId::new(9)).unwrap_err(),
            Error::UnknownChallenge
        );
        assert!(store.contains(&dev, ChallengeId::new(2)).unwrap());

        store.remove(&dev, ChallengeId::new(2)).unwrap();
        assert_eq!(
            store.remove(&dev, ChallengeId::new(2)),
            Err(Error::UnknownChallenge)
        );

        assert_eq!(store.remove_device(&dev).unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&DeviceId::new([2; 32]), ChallengeId::new(1)).unwrap());
    }

    #[test]
    fn test_memory_store_semantics() {
        let mut store = MemoryStore::<8>::new();
        exercise(&mut store);
    }

    #[test]
    fn test_slot_store_semantics() {
        let mut store = SlotStore::new(MemorySecureStorage::<8, 256>::new());
        exercise(&mut store);
    }

    #[test]
    fn test_memory_store_full() {
        let mut store = MemoryStore::<1>::new();
        store.put(record(1, 1, 0), OverwritePolicy::Reject).unwrap();
        assert_eq!(
            store.put(record(1, 2, 0), OverwritePolicy::Reject),
            Err(Error::StorageFull)
        );
    }

    #[test]
    fn test_slot_store_full_and_write_failure() {
        let mut store = SlotStore::new(MemorySecureStorage::<1, 256>::new());
        store.put(record(1, 1, 0), OverwritePolicy::Reject).unwrap();
        assert_eq!(
            store.put(record(1, 2, 0), OverwritePolicy::Reject),
            Err(Error::StorageFull)
        );

        let mut storage = MemorySecureStorage::<2, 256>::new();
        storage.set_fail_writes(true);
        let mut store = SlotStore::new(storage);
        assert_eq!(
            store.put(record(1, 1, 0), OverwritePolicy::Reject),
            Err(Error::StorageWriteFailed)
        );
    }

    fn serialized(record: &EnrollmentRecord) -> (usize, [u8; EnrollmentRecord::MAX_SERIALIZED_SIZE]) {
        let mut buf = [0u8; EnrollmentRecord::MAX_SERIALIZED_SIZE];
        let len = record.to_bytes(&mut buf).unwrap();
        (len, buf)
    }

    #[test]
    fn test_slot_store_skips_unrelated_corruption() {
        let mut storage = MemorySecureStorage::<4, 256>::new();
        let (len, buf) = serialized(&record(3, 3, 0xC3));
        storage.write(3, &buf[..len]).unwrap();
        storage.write(1, &[0xEE; 40]).unwrap();
        let mut store = SlotStore::new(storage);

        let healthy = store.get(&DeviceId::new([3; 32]), ChallengeId::new(3)).unwrap();
        assert_eq!(healthy.commitment, KeyCommitment::new([0xC3; 32]));
        assert_eq!(
            store.get(&DeviceId::new([1; 32]), ChallengeId::new(1)).unwrap_err(),
            Error::UnknownChallenge
        );

        store.put(record(5, 1, 0xD5), OverwritePolicy::Reject).unwrap();
        assert!(store.contains(&DeviceId::new([5; 32]), ChallengeId::new(1)).unwrap());
        assert_eq!(store.remove_device(&DeviceId::new([3; 32])).unwrap(), 1);

        assert!(store.log().count_category(EventCategory::Availability) >= 3);
        assert!(store.storage().is_slot_written(1).unwrap());
    }

    #[test]
    fn test_slot_store_damaged_record_fails_its_own_key() {
        let target = record(2, 9, 0xB2);
        let (len, buf) = serialized(&target);
        let mut storage = MemorySecureStorage::<4, 256>::new();
        storage.write(0, &buf[..len - 4]).unwrap();
        let mut store = SlotStore::new(storage);
        let dev = DeviceId::new([2; 32]);

        assert_eq!(store.get(&dev, ChallengeId::new(9)), Err(Error::StorageCorrupted));
        assert_eq!(store.contains(&dev, ChallengeId::new(9)), Err(Error::StorageCorrupted));
        assert_eq!(
            store.put(record(2, 9, 0xB3), OverwritePolicy::Reject),
            Err(Error::StorageCorrupted)
        );

        store.put(record(2, 9, 0xB3), OverwritePolicy::Overwrite).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&dev, ChallengeId::new(9)).unwrap().commitment,
            KeyCommitment::new([0xB3; 32])
        );
    }

    #[test]
    fn test_slot_store_removes_damaged_records_of_device() {
        let (len, buf) = serialized(&record(2, 9, 0xB2));
        let mut storage = MemorySecureStorage::<4, 256>::new();
        storage.write(2, &buf[..len - 4]).unwrap();
        let mut store = SlotStore::new(storage);
        store.put(record(2, 1, 0xB0), OverwritePolicy::Reject).unwrap();

        assert_eq!(store.remove_device(&DeviceId::new([2; 32])).unwrap(), 2);
        assert!(store.is_empty());
    }
}

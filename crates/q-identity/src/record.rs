// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Enrollment record
//!
//! The public outcome of enrolling one `(device, challenge)` pair: helper
//! data for the device and a key commitment for the verifier.

use q_common::constants::{MAX_HELPER_DATA_SIZE, SHA3_256_OUTPUT_SIZE};
use q_common::{ChallengeId, DeviceId, Error, KeyCommitment, Result, Timestamp};
use q_fuzzy::HelperData;

/// Persisted record format version
pub const RECORD_VERSION: u8 = 1;

/// Enrollment record for one `(device, challenge)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRecord {
    /// Enrolled device
    pub device_id: DeviceId,
    /// Enrolled challenge
    pub challenge_id: ChallengeId,
    /// Public helper data
    pub helper_data: HelperData,
    /// Commitment to the enrollment key
    pub commitment: KeyCommitment,
    /// Enrollment time
    pub enrolled_at: Timestamp,
}

impl EnrollmentRecord {
    /// Fixed part of the serialized record
    const HEADER_SIZE: usize = 1 + // version
        32 + // device_id
        4 + // challenge_id
        8 + // enrolled_at
        SHA3_256_OUTPUT_SIZE + // commitment
        2; // helper_len

    /// Largest serialized record
    pub const MAX_SERIALIZED_SIZE: usize = Self::HEADER_SIZE + MAX_HELPER_DATA_SIZE;

    /// Whether this record belongs to `(device, challenge)`
    #[must_use]
    pub fn matches(&self, device: &DeviceId, challenge: ChallengeId) -> bool {
        self.device_id == *device && self.challenge_id == challenge
    }

    /// Serialize into `buffer`, returning the number of bytes written
    ///
    /// Layout: `[version:1][device_id:32][challenge_id:4 LE][enrolled_at:8 LE]
    /// [commitment:32][helper_len:2 LE][helper_data]`
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `buffer` cannot hold the record.
    pub fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize> {
        let helper = self.helper_data.to_bytes()?;
        let total = Self::HEADER_SIZE + helper.len();
        if buffer.len() < total {
            return Err(Error::BufferTooSmall);
        }

        let mut offset = 0;

        buffer[offset] = RECORD_VERSION;
        offset += 1;

        buffer[offset..offset + 32].copy_from_slice(self.device_id.as_bytes());
        offset += 32;

        buffer[offset..offset + 4].copy_from_slice(&self.challenge_id.to_le_bytes());
        offset += 4;

        buffer[offset..offset + 8].copy_from_slice(&self.enrolled_at.as_secs().to_le_bytes());
        offset += 8;

        buffer[offset..offset + SHA3_256_OUTPUT_SIZE].copy_from_slice(self.commitment.as_bytes());
        offset += SHA3_256_OUTPUT_SIZE;

        buffer[offset..offset + 2].copy_from_slice(&(helper.len() as u16).to_le_bytes());
        offset += 2;

        buffer[offset..offset + helper.len()].copy_from_slice(&helper);
        offset += helper.len();

        Ok(offset)
    }

    /// Read the `(device, challenge)` key of a serialized record
    ///
    /// Only the version byte and the key fields are checked, so a record
    /// whose body is damaged can still be attributed to its key.
    #[must_use]
    pub fn peek_key(bytes: &[u8]) -> Option<(DeviceId, ChallengeId)> {
        if bytes.len() < 1 + 32 + 4 || bytes[0] != RECORD_VERSION {
            return None;
        }
        let device = DeviceId::from_slice(&bytes[1..33])?;
        let challenge = ChallengeId::from_le_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);
        Some((device, challenge))
    }

    /// Parse a serialized record
    ///
    /// # Errors
    ///
    /// Returns `StorageCorrupted` for an unknown version, inconsistent
    /// lengths or unparseable helper data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE || bytes[0] != RECORD_VERSION {
            return Err(Error::StorageCorrupted);
        }

        let mut offset = 1;

        let device_id =
            DeviceId::from_slice(&bytes[offset..offset + 32]).ok_or(Error::StorageCorrupted)?;
        offset += 32;

        let challenge_id = ChallengeId::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        offset += 4;

        let mut secs = [0u8; 8];
        secs.copy_from_slice(&bytes[offset..offset + 8]);
        let enrolled_at = Timestamp::new(u64::from_le_bytes(secs));
        offset += 8;

        let commitment = KeyCommitment::from_slice(&bytes[offset..offset + SHA3_256_OUTPUT_SIZE])
            .ok_or(Error::StorageCorrupted)?;
        offset += SHA3_256_OUTPUT_SIZE;

        let helper_len = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as usize;
        offset += 2;

        if bytes.len() != offset + helper_len {
            return Err(Error::StorageCorrupted);
        }
        let helper_data =
            HelperData::from_bytes(&bytes[offset..]).map_err(|_| Error::StorageCorrupted)?;

        Ok(Self {
            device_id,
            challenge_id,
            helper_data,
            commitment,
            enrolled_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use q_common::{CodeConfig, ResponseBits};
    use q_fuzzy::{BchSketch, ErrorCorrectingCode};

    fn sample() -> EnrollmentRecord {
        let sketch = BchSketch::new(CodeConfig::new(6, 63, 4)).unwrap();
        let reference = ResponseBits::from_bytes(&[0x5A; 8], 63).unwrap();
        let (_, helper_data) = sketch.encode(&reference).unwrap();
        EnrollmentRecord {
            device_id: DeviceId::new([0x11; 32]),
            challenge_id: ChallengeId::new(0x0102_0304),
            helper_data,
            commitment: KeyCommitment::new([0x22; 32]),
            enrolled_at: Timestamp::new(1_700_000_000),
        }
    }

    #[test]
    fn test_record_layout() {
        let record = sample();
        let mut buf = [0u8; EnrollmentRecord::MAX_SERIALIZED_SIZE];
        let len = record.to_bytes(&mut buf).unwrap();
        assert_eq!(len, 79 + 5 + 8 + 16);
        assert_eq!(buf[0], RECORD_VERSION);
        assert_eq!(&buf[33..37], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(EnrollmentRecord::from_bytes(&buf[..len]).unwrap(), record);
    }

    #[test]
    fn test_record_rejects_corruption() {
        let record = sample();
        let mut buf = [0u8; EnrollmentRecord::MAX_SERIALIZED_SIZE];
        let len = record.to_bytes(&mut buf).unwrap();

        assert_eq!(
            EnrollmentRecord::from_bytes(&buf[..len - 1]).unwrap_err(),
            Error::StorageCorrupted
        );

        let mut bad = buf;
        bad[0] = 9;
        assert_eq!(
            EnrollmentRecord::from_bytes(&bad[..len]).unwrap_err(),
            Error::StorageCorrupted
        );
    }

    #[test]
    fn test_record_buffer_too_small() {
        let mut buf = [0u8; 32];
        assert_eq!(sample().to_bytes(&mut buf).unwrap_err(), Error::BufferTooSmall);
    }

    #[test]
    fn test_peek_key_survives_body_damage() {
        let record = sample();
        let mut buf = [0u8; EnrollmentRecord::MAX_SERIALIZED_SIZE];
        let len = record.to_bytes(&mut buf).unwrap();
        buf[len - 3] ^= 0xFF;

        assert!(EnrollmentRecord::from_bytes(&buf[..len - 5]).is_err());
        assert_eq!(
            EnrollmentRecord::peek_key(&buf[..40]),
            Some((record.device_id, record.challenge_id))
        );
        assert_eq!(EnrollmentRecord::peek_key(&buf[..36]), None);
        assert_eq!(EnrollmentRecord::peek_key(&[0xEE; 40]), None);
    }
}

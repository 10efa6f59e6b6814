// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Enrollment record lifecycle
//!
//! Records are immutable once written. They leave the store only through
//! de-provisioning of a whole device or rotation of a single challenge.

use q_common::{
    log_info, log_warn, ChallengeId, DeviceId, Error, EventCategory, LogBuffer, OverwritePolicy,
    Result, Timestamp,
};
use q_crypto::Kdf;
use q_fuzzy::ErrorCorrectingCode;
use q_hal::PufInterface;

use crate::enrollment::EnrollmentEngine;
use crate::record::EnrollmentRecord;
use crate::storage::ChallengeResponseStore;

const MODULE: &str = "lifecycle";

/// Remove every record of `device`, returning how many were removed
///
/// # Errors
///
/// Returns `NotFound` if the device had no records and propagates store
/// errors.
pub fn deprovision_device<S: ChallengeResponseStore + ?Sized>(
    store: &mut S,
    device: &DeviceId,
    log: &mut LogBuffer,
    now: Timestamp,
) -> Result<usize> {
    let removed = store.remove_device(device)?;
    let ts = now.as_secs().saturating_mul(1000);
    if removed == 0 {
        log_warn!(
            log,
            ts,
            EventCategory::Lifecycle,
            MODULE,
            "deprovision of unknown device {}",
            device
        );
        return Err(Error::NotFound);
    }
    log_info!(
        log,
        ts,
        EventCategory::Lifecycle,
        MODULE,
        "deprovisioned {} ({} records)",
        device,
        removed
    );
    Ok(removed)
}

/// Replace challenge `retire` of `device` with a fresh enrollment of
/// `replacement`
///
/// The replacement is enrolled first; the retired record is removed only
/// once the new one is stored.
///
/// # Errors
///
/// Returns `UnknownChallenge` if `retire` is not enrolled,
/// `InvalidParameter` if both challenges are equal, `DuplicateChallenge` if
/// `replacement` is already enrolled, and propagates enrollment errors.
pub fn rotate_challenge<P, E, K, S>(
    engine: &mut EnrollmentEngine<P, E, K>,
    store: &mut S,
    device: DeviceId,
    retire: ChallengeId,
    replacement: ChallengeId,
    now: Timestamp,
) -> Result<EnrollmentRecord>
where
    P: PufInterface,
    E: ErrorCorrectingCode,
    K: Kdf,
    S: ChallengeResponseStore + ?Sized,
{
    if retire == replacement {
        return Err(Error::InvalidParameter);
    }
    if !store.contains(&device, retire)? {
        return Err(Error::UnknownChallenge);
    }

    let record =
        engine.enroll_with_policy(store, device, replacement, now, OverwritePolicy::Reject)?;
    store.remove(&device, retire)?;

    log_info!(
        engine.log_mut(),
        now.as_secs().saturating_mul(1000),
        EventCategory::Lifecycle,
        MODULE,
        "rotated {} {} -> {}",
        device,
        retire,
        replacement
    );
    Ok(record)
}

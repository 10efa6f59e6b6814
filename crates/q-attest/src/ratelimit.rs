// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Per-device mismatch rate limiting
//!
//! Every proof mismatch costs its device one token. Tokens come back one per
//! refill interval up to the burst capacity. A device without tokens cannot
//! be issued new challenges until it recovers, which bounds online guessing.

use heapless::LinearMap;
use q_common::constants::MAX_LIMITED_DEVICES;
use q_common::{DeviceId, Millis, Ticks};

/// Token bucket measured in tolerated mismatches
#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: u32,
    last_refill: Ticks,
}

impl TokenBucket {
    const fn full(capacity: u32, now: Ticks) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Ticks, capacity: u32, interval_ms: u64) {
        if now <= self.last_refill {
            return;
        }
        let intervals = self.last_refill.elapsed(now) / interval_ms;
        if intervals == 0 {
            return;
        }
        let tokens = u64::from(self.tokens).saturating_add(intervals);
        self.tokens = tokens.min(u64::from(capacity)) as u32;
        self.last_refill = self.last_refill + intervals.saturating_mul(interval_ms);
    }
}

/// Mismatch limiter keyed by device
#[derive(Debug)]
pub struct MismatchLimiter {
    capacity: u32,
    interval_ms: u64,
    buckets: LinearMap<DeviceId, TokenBucket, MAX_LIMITED_DEVICES>,
}

impl MismatchLimiter {
    /// Allow `burst` mismatches, regaining one every `refill`
    #[must_use]
    pub fn new(burst: u8, refill: Millis) -> Self {
        Self {
            capacity: u32::from(burst.max(1)),
            interval_ms: u64::from(refill.as_millis().max(1)),
            buckets: LinearMap::new(),
        }
    }

    /// Whether `device` may be challenged at `now`
    pub fn check(&mut self, device: &DeviceId, now: Ticks) -> bool {
        let (capacity, interval) = (self.capacity, self.interval_ms);
        match self.buckets.get_mut(device) {
            Some(bucket) => {
                bucket.refill(now, capacity, interval);
                bucket.tokens > 0
            }
            None => true,
        }
    }

    /// Charge one mismatch to `device`
    ///
    /// Returns `false` if the charge could not be tracked: the device has no
    /// bucket yet and every tracked device is still paying off mismatches.
    #[must_use]
    pub fn record_mismatch(&mut self, device: &DeviceId, now: Ticks) -> bool {
        let (capacity, interval) = (self.capacity, self.interval_ms);
        if let Some(bucket) = self.buckets.get_mut(device) {
            bucket.refill(now, capacity, interval);
            bucket.tokens = bucket.tokens.saturating_sub(1);
            return true;
        }

        if self.buckets.len() == self.buckets.capacity() && !self.evict(now) {
            return false;
        }
        let mut bucket = TokenBucket::full(capacity, now);
        bucket.tokens -= 1;
        self.buckets.insert(*device, bucket).is_ok()
    }

    /// Remaining tolerated mismatches for `device`
    pub fn remaining(&mut self, device: &DeviceId, now: Ticks) -> u32 {
        let (capacity, interval) = (self.capacity, self.interval_ms);
        self.buckets.get_mut(device).map_or(capacity, |bucket| {
            bucket.refill(now, capacity, interval);
            bucket.tokens
        })
    }

    /// Number of devices with a bucket
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }

    /// Drop the fully recovered bucket that recovered first
    ///
    /// Buckets still short of capacity carry live mismatch history and are
    /// never evicted.
    fn evict(&mut self, now: Ticks) -> bool {
        let (capacity, interval) = (self.capacity, self.interval_ms);
        let mut victim: Option<(DeviceId, Ticks)> = None;
        for (device, bucket) in self.buckets.iter_mut() {
            bucket.refill(now, capacity, interval);
            if bucket.tokens < capacity {
                continue;
            }
            if victim.map_or(true, |(_, oldest)| bucket.last_refill < oldest) {
                victim = Some((*device, bucket.last_refill));
            }
        }
        match victim {
            Some((device, _)) => self.buckets.remove(&device).is_some(),
            None => false,
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Time utilities
//!
//! Monotonic millisecond ticks and deadlines. Protocol sessions are driven
//! by an explicit `now: Ticks` supplied by the caller, so deadline handling
//! is deterministic and testable without a clock.

use core::ops::{Add, Sub};

/// Monotonic tick counter (one tick per millisecond)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(u64);

impl Ticks {
    /// Create from raw tick count
    #[must_use]
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Calculate elapsed ticks since this timestamp
    #[must_use]
    pub const fn elapsed(&self, now: Self) -> u64 {
        now.0.saturating_sub(self.0)
    }
}

impl From<u64> for Ticks {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Ticks> for u64 {
    fn from(value: Ticks) -> Self {
        value.0
    }
}

impl Add<u64> for Ticks {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl Add<Millis> for Ticks {
    type Output = Self;

    fn add(self, rhs: Millis) -> Self::Output {
        Self(self.0.saturating_add(u64::from(rhs.0)))
    }
}

impl Sub<Ticks> for Ticks {
    type Output = u64;

    fn sub(self, rhs: Ticks) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}

/// Duration in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millis(u32);

impl Millis {
    /// Create from milliseconds
    #[must_use]
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Create from seconds
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Get as milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    /// Zero duration
    pub const ZERO: Self = Self(0);
}

impl From<u32> for Millis {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Millis> for u32 {
    fn from(value: Millis) -> Self {
        value.0
    }
}

/// Absolute expiry point on the tick clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires: Ticks,
}

impl Deadline {
    /// Deadline `timeout` after `start`
    #[must_use]
    pub fn after(start: Ticks, timeout: Millis) -> Self {
        Self {
            expires: start + timeout,
        }
    }

    /// Tick at which the deadline expires
    #[must_use]
    pub const fn expires_at(&self) -> Ticks {
        self.expires
    }

    /// True once `now` has reached the expiry tick
    #[must_use]
    pub const fn is_expired(&self, now: Ticks) -> bool {
        now.0 >= self.expires.0
    }

    /// Milliseconds left before expiry, 0 once expired
    #[must_use]
    pub const fn remaining(&self, now: Ticks) -> u64 {
        now.elapsed(self.expires)
    }
}

//! Clock abstraction for token expiry checks.
//!
//! Token verification depends on "now". Production uses the system clock;
//! tests pin time with [`FixedClock`] so expiry behaviour is deterministic.

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Get the current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Real clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

//! Time source for event timestamps.
//!
//! [`EventMetadata::record`](crate::event::EventMetadata::record) stamps
//! `occurred_at` through this trait instead of reading `Utc::now`
//! directly, so recording an event stays deterministic under test.

use chrono::{DateTime, Utc};

/// Source of the current instant for `occurred_at` stamps.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time; the only [`Clock`] wired outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

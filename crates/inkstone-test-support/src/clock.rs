//! Deterministic clock for tests.

use chrono::{DateTime, TimeZone, Utc};
use inkstone_core::clock::Clock;

/// A [`Clock`] pinned to one instant, so `occurred_at` stamps on recorded
/// events are reproducible across runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pins the clock to a calendar instant in UTC.
    ///
    /// # Panics
    ///
    /// Panics when the components do not name a valid instant.
    #[must_use]
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self(
            Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
                .unwrap(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

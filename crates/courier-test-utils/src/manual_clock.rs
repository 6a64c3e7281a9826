// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A hand-driven clock for deterministic scheduling tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use courier_core::Clock;

/// Clock whose current instant only moves when a test advances it.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock pinned at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock pinned at a fixed, arbitrary test epoch.
    pub fn default_epoch() -> Self {
        let start = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .expect("valid test epoch")
            .with_timezone(&Utc);
        Self::new(start)
    }

    /// Move the clock forward by `seconds`.
    pub fn advance_secs(&self, seconds: i64) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += Duration::seconds(seconds);
    }

    /// Pin the clock at an exact instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

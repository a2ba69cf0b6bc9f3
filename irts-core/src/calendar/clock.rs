//! Wall-clock source for "today".

use std::fmt::Debug;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

/// Supplies the current local instant.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;

    /// `now()` truncated to its calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the system clock and converts it to a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// São Paulo time, which is what the published data is dated in.
    pub fn brazil() -> Self {
        Self::new(chrono_tz::America::Sao_Paulo)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::brazil()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Midnight at the start of `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

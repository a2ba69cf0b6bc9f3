use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use super::business_days::BusinessDays;
use super::clock::Clock;
use super::holidays::{HolidaySet, HolidaySource};

/// Business-day calendar anchored to a clock.
///
/// The holiday set is fixed at construction; there is no refresh.
#[derive(Debug, Clone)]
pub struct BusinessCalendar {
    days: BusinessDays,
    clock: Arc<dyn Clock>,
}

impl BusinessCalendar {
    pub fn new(holidays: HolidaySet, clock: Arc<dyn Clock>) -> Self {
        Self {
            days: BusinessDays::new(holidays),
            clock,
        }
    }

    /// Fetch holidays from `source`.
    ///
    /// Never fails: if the source errors, a warning is logged and the calendar
    /// falls back to weekday-only logic.
    pub fn load(source: &dyn HolidaySource, clock: Arc<dyn Clock>) -> Self {
        let holidays = match source.fetch_holidays() {
            Ok(holidays) => {
                info!(
                    source = source.name(),
                    count = holidays.len(),
                    first = ?holidays.first(),
                    last = ?holidays.last(),
                    "holiday calendar loaded"
                );
                holidays
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    error = %e,
                    "failed to load holidays, using weekday-only calendar"
                );
                HolidaySet::new()
            }
        };
        Self::new(holidays, clock)
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn business_days(&self) -> &BusinessDays {
        &self.days
    }

    pub fn holidays(&self) -> &HolidaySet {
        self.days.holidays()
    }

    pub fn holiday_count(&self) -> usize {
        self.days.holidays().len()
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.days.is_business_day(date)
    }

    pub fn previous_business_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.days.previous_business_day(date)
    }

    pub fn next_business_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.days.next_business_day(date)
    }

    pub fn add_business_days(&self, date: NaiveDate, n: i32) -> Option<NaiveDate> {
        self.days.add_business_days(date, n)
    }

    pub fn day_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        self.days.day_range(start, end)
    }

    pub fn day_count(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.days.day_count(start, end)
    }

    /// The business day before today; the default scrape target.
    pub fn previous_business_day_before_today(&self) -> Option<NaiveDate> {
        self.previous_business_day(self.today())
    }
}

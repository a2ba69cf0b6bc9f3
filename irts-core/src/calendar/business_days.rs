//! Business-day arithmetic over a fixed holiday set.
//!
//! A business day is Monday through Friday and not a holiday. Every stepping
//! function walks one calendar day at a time; since at most two consecutive
//! weekend days exist and the holiday set is finite, every walk terminates.
//! Stepping past either end of chrono's date range yields `None`.

use chrono::{Datelike, NaiveDate, Weekday};

use super::holidays::HolidaySet;

/// Weekday predicate plus holiday set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessDays {
    holidays: HolidaySet,
}

impl BusinessDays {
    pub fn new(holidays: HolidaySet) -> Self {
        Self { holidays }
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    pub fn is_weekday(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.is_weekday(date) && !self.is_holiday(date)
    }

    /// `date` if it is a business day, otherwise the next one after it.
    /// `None` when the walk runs past the last representable date.
    pub fn roll_forward(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut d = date;
        while !self.is_business_day(d) {
            d = d.succ_opt()?;
        }
        Some(d)
    }

    /// `date` if it is a business day, otherwise the last one before it.
    pub fn roll_backward(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut d = date;
        while !self.is_business_day(d) {
            d = d.pred_opt()?;
        }
        Some(d)
    }

    /// First business day strictly after `date`.
    pub fn next_business_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.roll_forward(date.succ_opt()?)
    }

    /// Last business day strictly before `date`, whether or not `date` is one.
    pub fn previous_business_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.roll_backward(date.pred_opt()?)
    }

    /// Move `n` business days from `date`.
    ///
    /// A non-business start counts as sitting just before (or after, for
    /// negative `n`) its neighbouring business day, so `+1` from a Saturday is
    /// the Monday and `-1` is the Friday. `n == 0` rolls forward.
    pub fn add_business_days(&self, date: NaiveDate, n: i32) -> Option<NaiveDate> {
        if n == 0 {
            return self.roll_forward(date);
        }
        let mut d = date;
        for _ in 0..n.unsigned_abs() {
            d = if n > 0 {
                self.next_business_day(d)?
            } else {
                self.previous_business_day(d)?
            };
        }
        Some(d)
    }

    /// Business days in `[start, end]`, ascending. Empty when `start > end`.
    pub fn day_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        if start > end {
            return out;
        }
        let mut next = self.roll_forward(start);
        while let Some(d) = next.filter(|d| *d <= end) {
            out.push(d);
            next = self.next_business_day(d);
        }
        out
    }

    /// Number of business-day steps between `start` and `end`.
    ///
    /// This is `day_range(start, end).len() - 1` floored at zero: a Monday to
    /// the following Friday is 4, not 5.
    pub fn day_count(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.day_range(start, end).len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Carnival 2025 fell on Monday 3 and Tuesday 4 March.
    fn carnival() -> BusinessDays {
        BusinessDays::new(vec![d(2025, 3, 3), d(2025, 3, 4)].into_iter().collect())
    }

    #[test]
    fn weekends_and_holidays_are_not_business_days() {
        let cal = carnival();
        assert!(!cal.is_business_day(d(2025, 3, 1))); // Saturday
        assert!(!cal.is_business_day(d(2025, 3, 2))); // Sunday
        assert!(!cal.is_business_day(d(2025, 3, 3)));
        assert!(!cal.is_business_day(d(2025, 3, 4)));
        assert!(cal.is_business_day(d(2025, 3, 5)));
        assert!(cal.is_business_day(d(2025, 2, 28)));
    }

    #[test]
    fn previous_business_day_skips_weekend_and_holidays() {
        let cal = carnival();
        assert_eq!(cal.previous_business_day(d(2025, 3, 5)), Some(d(2025, 2, 28)));
        // From a holiday itself
        assert_eq!(cal.previous_business_day(d(2025, 3, 4)), Some(d(2025, 2, 28)));
        assert_eq!(cal.previous_business_day(d(2025, 3, 6)), Some(d(2025, 3, 5)));
    }

    #[test]
    fn next_business_day_skips_weekend_and_holidays() {
        let cal = carnival();
        assert_eq!(cal.next_business_day(d(2025, 2, 28)), Some(d(2025, 3, 5)));
        assert_eq!(cal.next_business_day(d(2025, 3, 1)), Some(d(2025, 3, 5)));
    }

    #[test]
    fn rolling_keeps_business_days_in_place() {
        let cal = carnival();
        assert_eq!(cal.roll_forward(d(2025, 3, 5)), Some(d(2025, 3, 5)));
        assert_eq!(cal.roll_backward(d(2025, 3, 5)), Some(d(2025, 3, 5)));
        assert_eq!(cal.roll_forward(d(2025, 3, 1)), Some(d(2025, 3, 5)));
        assert_eq!(cal.roll_backward(d(2025, 3, 4)), Some(d(2025, 2, 28)));
    }

    #[test]
    fn add_business_days_from_non_business_start() {
        let cal = BusinessDays::default();
        let saturday = d(2025, 3, 8);
        assert_eq!(cal.add_business_days(saturday, 1), Some(d(2025, 3, 10)));
        assert_eq!(cal.add_business_days(saturday, -1), Some(d(2025, 3, 7)));
        assert_eq!(cal.add_business_days(saturday, 0), Some(d(2025, 3, 10)));
        assert_eq!(cal.add_business_days(d(2025, 3, 10), 5), Some(d(2025, 3, 17)));
        assert_eq!(
            carnival().add_business_days(d(2025, 3, 12), -5),
            Some(d(2025, 3, 5))
        );
    }

    #[test]
    fn day_range_is_inclusive_and_skips_non_business_days() {
        let cal = carnival();
        let range = cal.day_range(d(2025, 2, 27), d(2025, 3, 6));
        assert_eq!(
            range,
            vec![d(2025, 2, 27), d(2025, 2, 28), d(2025, 3, 5), d(2025, 3, 6)]
        );
    }

    #[test]
    fn day_range_empty_when_reversed() {
        let cal = carnival();
        assert!(cal.day_range(d(2025, 3, 6), d(2025, 3, 5)).is_empty());
        assert_eq!(cal.day_count(d(2025, 3, 6), d(2025, 3, 5)), 0);
    }

    #[test]
    fn day_range_within_a_weekend_is_empty() {
        let cal = BusinessDays::default();
        assert!(cal.day_range(d(2025, 3, 8), d(2025, 3, 9)).is_empty());
    }

    #[test]
    fn day_count_counts_steps() {
        let cal = BusinessDays::default();
        // Monday to Friday of the same week
        assert_eq!(cal.day_count(d(2025, 3, 10), d(2025, 3, 14)), 4);
        assert_eq!(cal.day_count(d(2025, 3, 10), d(2025, 3, 10)), 0);
        // Saturday start rolls to Monday
        assert_eq!(cal.day_count(d(2025, 3, 8), d(2025, 3, 12)), 2);
    }

    #[test]
    fn empty_holiday_set_is_plain_weekday_logic() {
        let cal = BusinessDays::default();
        assert!(cal.is_business_day(d(2025, 3, 3)));
        assert!(cal.holidays().is_empty());
        assert_eq!(cal.previous_business_day(d(2025, 3, 3)), Some(d(2025, 2, 28)));
    }

    #[test]
    fn stepping_at_the_ends_of_the_date_range() {
        let cal = BusinessDays::default();
        assert_eq!(cal.next_business_day(NaiveDate::MAX), None);
        assert_eq!(cal.previous_business_day(NaiveDate::MIN), None);
        assert_eq!(cal.add_business_days(NaiveDate::MAX, 3), None);
        assert_eq!(cal.add_business_days(NaiveDate::MIN, -3), None);

        // Ranges touching the ends stop instead of overflowing
        let last_week = NaiveDate::MAX - chrono::Days::new(10);
        let range = cal.day_range(last_week, NaiveDate::MAX);
        assert!(!range.is_empty());
        assert!(range.iter().all(|d| cal.is_business_day(*d)));
        assert_eq!(cal.day_count(NaiveDate::MAX, NaiveDate::MAX), 0);
    }
}

//! Business-day calendar.
//!
//! - [`holidays`]: holiday sets and their sources
//! - [`business_days`]: pure stepping over weekdays and holidays
//! - [`clock`]: what "today" means
//! - [`business_calendar`]: the two combined

pub mod business_calendar;
pub mod business_days;
pub mod clock;
pub mod holidays;

pub use business_calendar::BusinessCalendar;
pub use business_days::BusinessDays;
pub use clock::{Clock, FixedClock, SystemClock};
pub use holidays::{
    parse_holiday_workbook, AnbimaHolidaySource, CsvHolidaySource, HolidayError, HolidaySet,
    HolidaySource, StaticHolidays, ANBIMA_HOLIDAYS_URL,
};

//! IRTS Core: business-day calendar, parameter records, ANBIMA source, dataset store.
//!
//! The scrape workflow itself lives in `irts-runner`; everything here is a
//! building block it depends on through traits:
//! - [`calendar::BusinessCalendar`] with a [`calendar::HolidaySource`]
//! - [`source::ParameterSource`]
//! - [`store::DatasetStore`]

pub mod calendar;
pub mod domain;
pub mod source;
pub mod store;

pub use calendar::{BusinessCalendar, BusinessDays, Clock, FixedClock, HolidaySet, SystemClock};
pub use domain::ParameterRecord;
pub use source::{ParameterSource, SourceError};
pub use store::{Dataset, DatasetStore, StoreError};

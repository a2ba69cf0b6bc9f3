//! Scrape orchestration for one reference date.
//!
//! validate → load → duplicate check → fetch → merge → write. The store is
//! read exactly once per call and written at most once; every skip path
//! leaves it untouched.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, warn};

use irts_core::calendar::BusinessCalendar;
use irts_core::source::{ParameterSource, SourceError};
use irts_core::store::{Dataset, DatasetStore, StoreError, DATE_COLUMN};

/// How many business-day steps back from today a date may be.
pub const DEFAULT_STALENESS_WINDOW: usize = 5;

/// Why a date was not scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotBusinessDay,
    FutureDate { today: NaiveDate },
    TooStale { steps: usize, window: usize },
    AlreadyPresent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotBusinessDay => write!(f, "not a business day"),
            SkipReason::FutureDate { today } => write!(f, "in the future (today is {today})"),
            SkipReason::TooStale { steps, window } => write!(
                f,
                "{steps} business days old, beyond the {window}-day window"
            ),
            SkipReason::AlreadyPresent => write!(f, "already present in the dataset"),
        }
    }
}

/// Result of a completed update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { fetched: usize, total_rows: usize },
    Skipped(SkipReason),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("scrape failed: {0}")]
    Source(#[from] SourceError),

    #[error("dataset store error: {0}")]
    Store(#[from] StoreError),
}

/// Validates dates and keeps the parameter dataset up to date.
pub struct IrtsManager<'a> {
    calendar: &'a BusinessCalendar,
    source: &'a dyn ParameterSource,
    store: &'a dyn DatasetStore,
    staleness_window: usize,
}

impl<'a> IrtsManager<'a> {
    pub fn new(
        calendar: &'a BusinessCalendar,
        source: &'a dyn ParameterSource,
        store: &'a dyn DatasetStore,
    ) -> Self {
        Self {
            calendar,
            source,
            store,
            staleness_window: DEFAULT_STALENESS_WINDOW,
        }
    }

    pub fn with_staleness_window(mut self, window: usize) -> Self {
        self.staleness_window = window;
        self
    }

    pub fn staleness_window(&self) -> usize {
        self.staleness_window
    }

    /// Check `date` against the calendar. The first failing check wins.
    pub fn validate_date(&self, date: NaiveDate) -> Result<(), SkipReason> {
        if !self.calendar.is_business_day(date) {
            warn!(%date, "date is not a business day");
            return Err(SkipReason::NotBusinessDay);
        }

        let today = self.calendar.today();
        if date > today {
            warn!(%date, %today, "date is in the future");
            return Err(SkipReason::FutureDate { today });
        }

        let steps = self.calendar.day_count(date, today);
        if steps > self.staleness_window {
            warn!(
                %date,
                steps,
                window = self.staleness_window,
                "date is too old"
            );
            return Err(SkipReason::TooStale {
                steps,
                window: self.staleness_window,
            });
        }

        Ok(())
    }

    pub fn is_valid_date(&self, date: NaiveDate) -> bool {
        self.validate_date(date).is_ok()
    }

    /// Scrape `date` and merge it into the stored dataset.
    ///
    /// Returns `Skipped` without touching the store when the date fails
    /// validation or is already present. Fetch and store errors propagate.
    pub fn scrape_and_update(&self, date: NaiveDate) -> Result<UpdateOutcome, ManagerError> {
        if let Err(reason) = self.validate_date(date) {
            return Ok(UpdateOutcome::Skipped(reason));
        }

        let existing = match self.store.load()? {
            Some(dataset) => {
                info!(
                    store = %self.store.describe(),
                    rows = dataset.height(),
                    "existing dataset loaded"
                );
                dataset
            }
            None => {
                info!(store = %self.store.describe(), "no existing dataset, starting a new one");
                Dataset::empty()
            }
        };

        if !existing.is_empty() {
            if existing.has_column(DATE_COLUMN) {
                if existing.contains_date(date)? {
                    info!(%date, "data already present, skipping scrape");
                    return Ok(UpdateOutcome::Skipped(SkipReason::AlreadyPresent));
                }
            } else {
                warn!(
                    store = %self.store.describe(),
                    "existing dataset has no '{DATE_COLUMN}' column, cannot check for duplicates"
                );
            }
        }

        info!(%date, source = self.source.name(), "scraping");
        let records = self.source.fetch(date).map_err(|e| {
            error!(%date, source = self.source.name(), error = %e, "scrape failed");
            e
        })?;
        let fetched = records.len();
        info!(%date, rows = fetched, "new data fetched");

        let merged = existing.merge(&Dataset::from_records(&records)?)?;
        self.store.write(&merged)?;

        let total_rows = merged.height();
        info!(store = %self.store.describe(), rows = total_rows, "dataset saved");

        Ok(UpdateOutcome::Updated {
            fetched,
            total_rows,
        })
    }
}

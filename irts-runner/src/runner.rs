//! Wires a [`RunnerConfig`] into calendar, source and store.
//!
//! Two entry points:
//! - `run_update()`: builds everything from config, then runs. Used by the CLI.
//! - `run_update_with()`: takes pre-built collaborators. Used by tests.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use irts_core::calendar::{
    AnbimaHolidaySource, BusinessCalendar, CsvHolidaySource, HolidaySet, SystemClock,
};
use irts_core::source::{AnbimaSource, ParameterSource, SourceError};
use irts_core::store::{DatasetStore, FileStore, StoreError, StoreMeta};

use crate::config::{ConfigError, RunnerConfig};
use crate::manager::{IrtsManager, ManagerError, UpdateOutcome};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("source setup error: {0}")]
    Source(#[from] SourceError),
    #[error("store setup error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Manager(#[from] ManagerError),
    #[error("no business day precedes {0}")]
    NoTargetDate(NaiveDate),
}

/// What one update run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub date: NaiveDate,
    pub outcome: UpdateOutcome,
}

/// Calendar in the configured timezone with holidays from the configured
/// source. Holiday failures degrade to a weekday-only calendar.
pub fn build_calendar(config: &RunnerConfig) -> Result<BusinessCalendar, ConfigError> {
    let clock = Arc::new(SystemClock::new(config.tz()?));

    let calendar = match &config.holidays.file {
        Some(path) => BusinessCalendar::load(&CsvHolidaySource::new(path), clock),
        None => match AnbimaHolidaySource::new(&config.holidays.url, config.holidays.timeout()) {
            Ok(source) => BusinessCalendar::load(&source, clock),
            Err(e) => {
                warn!(error = %e, "holiday source unavailable, using weekday-only calendar");
                BusinessCalendar::new(HolidaySet::new(), clock)
            }
        },
    };
    Ok(calendar)
}

pub fn build_source(config: &RunnerConfig) -> Result<AnbimaSource, SourceError> {
    AnbimaSource::new(
        &config.source.url,
        config.source.timeout(),
        config.source.retry_policy(),
    )
}

pub fn build_store(config: &RunnerConfig) -> Result<FileStore, StoreError> {
    FileStore::new(config.dataset_path())
}

/// Build everything from `config` and update `date`, or the business day
/// before today when `date` is `None`.
pub fn run_update(config: &RunnerConfig, date: Option<NaiveDate>) -> Result<UpdateReport, RunError> {
    let store = build_store(config)?;
    let source = build_source(config)?;
    let calendar = build_calendar(config)?;
    run_update_with(config, &calendar, &source, &store, date)
}

/// Update with pre-built collaborators: no setup I/O.
pub fn run_update_with(
    config: &RunnerConfig,
    calendar: &BusinessCalendar,
    source: &dyn ParameterSource,
    store: &dyn DatasetStore,
    date: Option<NaiveDate>,
) -> Result<UpdateReport, RunError> {
    let date = match date {
        Some(date) => date,
        None => calendar
            .previous_business_day_before_today()
            .ok_or(RunError::NoTargetDate(calendar.today()))?,
    };
    info!(%date, today = %calendar.today(), "update requested");

    let outcome = IrtsManager::new(calendar, source, store)
        .with_staleness_window(config.staleness_window)
        .scrape_and_update(date)?;

    match outcome {
        UpdateOutcome::Updated {
            fetched,
            total_rows,
        } => info!(%date, fetched, total_rows, "dataset updated"),
        UpdateOutcome::Skipped(reason) => info!(%date, %reason, "scrape skipped"),
    }

    Ok(UpdateReport { date, outcome })
}

/// Offline summary of the stored dataset.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub row_count: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub meta: Option<StoreMeta>,
    pub holiday_source: String,
}

pub fn store_status(config: &RunnerConfig) -> Result<StoreStatus, RunError> {
    let store = build_store(config)?;
    let dataset = store.load()?;

    let (row_count, date_range) = match &dataset {
        Some(ds) => (ds.height(), ds.date_bounds()?),
        None => (0, None),
    };

    let holiday_source = match &config.holidays.file {
        Some(path) => format!("file {}", path.display()),
        None => format!("url {}", config.holidays.url),
    };

    Ok(StoreStatus {
        path: store.path().to_path_buf(),
        exists: dataset.is_some(),
        row_count,
        date_range,
        meta: store.meta(),
        holiday_source,
    })
}

//! Holiday sets and the sources they are loaded from.
//!
//! The calendar never fetches anything by itself: a [`HolidaySource`] is handed
//! to [`BusinessCalendar::load`](super::BusinessCalendar::load), which keeps the
//! resulting [`HolidaySet`] for its whole lifetime.
//!
//! Sources:
//! - [`AnbimaHolidaySource`]: ANBIMA's national holiday workbook (`.xls`)
//! - [`CsvHolidaySource`]: a local CSV file, first column holds the dates
//! - [`StaticHolidays`]: an in-memory set (tests, offline runs)

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use calamine::{Data, DataType, Reader, Xls};
use chrono::NaiveDate;
use thiserror::Error;

/// ANBIMA national holiday list.
pub const ANBIMA_HOLIDAYS_URL: &str =
    "https://www.anbima.com.br/feriados/arqs/feriados_nacionais.xls";

/// Immutable set of non-business calendar dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Empty set: every weekday is a business day.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Earliest holiday, if any.
    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Latest holiday, if any.
    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

/// Errors while loading a holiday set.
#[derive(Debug, Error)]
pub enum HolidayError {
    #[error("holiday request failed: {0}")]
    Network(String),

    #[error("holiday file unreadable: {0}")]
    Io(String),

    #[error("holiday file format changed: {0}")]
    Format(String),
}

/// Anything that can produce the holiday set for the calendar.
pub trait HolidaySource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    fn fetch_holidays(&self) -> Result<HolidaySet, HolidayError>;
}

/// Downloads ANBIMA's national holiday workbook.
pub struct AnbimaHolidaySource {
    client: reqwest::blocking::Client,
    url: String,
}

impl AnbimaHolidaySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, HolidayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HolidayError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HolidaySource for AnbimaHolidaySource {
    fn name(&self) -> &str {
        "anbima_holidays"
    }

    fn fetch_holidays(&self) -> Result<HolidaySet, HolidayError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| HolidayError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HolidayError::Network(format!(
                "HTTP {status} from {}",
                self.url
            )));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| HolidayError::Network(format!("failed to read body: {e}")))?;

        parse_holiday_workbook(&bytes)
    }
}

/// Read holidays from a local CSV file.
///
/// The first column of each row is parsed as a date (`YYYY-MM-DD` or
/// `DD/MM/YYYY`); the header row and rows without a date are discarded.
pub struct CsvHolidaySource {
    path: PathBuf,
}

impl CsvHolidaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HolidaySource for CsvHolidaySource {
    fn name(&self) -> &str {
        "csv_holidays"
    }

    fn fetch_holidays(&self) -> Result<HolidaySet, HolidayError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| {
                HolidayError::Io(format!("failed to open '{}': {e}", self.path.display()))
            })?;

        let mut dates = BTreeSet::new();
        for (idx, result) in reader.records().enumerate() {
            // +2: records() starts after the header, lines are 1-based
            let record = result
                .map_err(|e| HolidayError::Format(format!("line {}: {e}", idx + 2)))?;
            if let Some(date) = record.get(0).and_then(parse_date_text) {
                dates.insert(date);
            }
        }

        Ok(HolidaySet { dates })
    }
}

/// A fixed, in-memory holiday set.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays(pub HolidaySet);

impl HolidaySource for StaticHolidays {
    fn name(&self) -> &str {
        "static_holidays"
    }

    fn fetch_holidays(&self) -> Result<HolidaySet, HolidayError> {
        Ok(self.0.clone())
    }
}

/// Parse the holiday workbook: first sheet, first column.
///
/// Cells that are not dates (the `Data` header, the trailing source notes,
/// blanks) are dropped.
pub fn parse_holiday_workbook(bytes: &[u8]) -> Result<HolidaySet, HolidayError> {
    let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
        .map_err(|e| HolidayError::Format(format!("not an xls workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HolidayError::Format("workbook has no sheets".into()))?
        .map_err(|e| HolidayError::Format(format!("first sheet unreadable: {e}")))?;

    Ok(range
        .rows()
        .filter_map(|row| row.first())
        .filter_map(cell_date)
        .collect())
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::String(text) => parse_date_text(text),
        Data::Empty | Data::Error(_) | Data::Bool(_) => None,
        other => other.as_date(),
    }
}

/// Parse `YYYY-MM-DD` or `DD/MM/YYYY`.
pub(crate) fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
}

//! In-memory parameter table.
//!
//! A [`Dataset`] wraps a polars frame so the table can carry columns beyond
//! the canonical schema (older files, manual additions) without losing them
//! on rewrite.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use super::schema::{ParameterSchema, DATE_COLUMN, TYPE_COLUMN, VALUE_COLUMNS};
use super::StoreError;
use crate::domain::ParameterRecord;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn frame_err(context: &str) -> impl Fn(PolarsError) -> StoreError + '_ {
    move |e| StoreError::Frame(format!("{context}: {e}"))
}

/// The full parameter table.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// No rows, no columns.
    pub fn empty() -> Self {
        Self {
            frame: DataFrame::empty(),
        }
    }

    /// Wrap a frame read from storage.
    ///
    /// A `date` column stored as a timestamp is cast to a calendar date.
    pub fn from_frame(mut frame: DataFrame) -> Result<Self, StoreError> {
        let dtype = frame.column(DATE_COLUMN).ok().map(|c| c.dtype().clone());
        match dtype {
            None | Some(DataType::Date) => {}
            Some(DataType::Datetime(_, _)) => {
                let date = frame
                    .column(DATE_COLUMN)
                    .and_then(|c| c.cast(&DataType::Date))
                    .map_err(frame_err("date normalization"))?;
                frame
                    .with_column(date)
                    .map_err(frame_err("date normalization"))?;
            }
            Some(other) => {
                return Err(StoreError::Frame(format!(
                    "'{DATE_COLUMN}' column has unsupported type {other}"
                )))
            }
        }
        Ok(Self { frame })
    }

    /// Build a canonical table from records, in the given order.
    pub fn from_records(records: &[ParameterRecord]) -> Result<Self, StoreError> {
        let dates: Vec<i32> = records.iter().map(|r| to_epoch_days(r.date)).collect();
        let types: Vec<&str> = records.iter().map(|r| r.curve_type.as_str()).collect();

        let mut columns = vec![
            Column::new(DATE_COLUMN.into(), dates)
                .cast(&DataType::Date)
                .map_err(frame_err("date cast"))?,
            Column::new(TYPE_COLUMN.into(), types),
        ];
        for (idx, name) in VALUE_COLUMNS.iter().enumerate() {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.values()[idx]).collect();
            columns.push(Column::new((*name).into(), values));
        }

        let frame = DataFrame::new(columns).map_err(frame_err("dataframe creation"))?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Every row's date, `None` where the cell is null. Errors if the table
    /// has no `date` column.
    pub fn dates(&self) -> Result<Vec<Option<NaiveDate>>, StoreError> {
        let column = self
            .frame
            .column(DATE_COLUMN)
            .map_err(frame_err("date column"))?;
        let date_ca = column.date().map_err(frame_err("date column type"))?;

        let mut out = Vec::with_capacity(self.frame.height());
        for i in 0..self.frame.height() {
            out.push(date_ca.get(i).and_then(from_epoch_days));
        }
        Ok(out)
    }

    pub fn contains_date(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.dates()?.contains(&Some(date)))
    }

    /// Earliest and latest non-null date.
    pub fn date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
        if !self.has_column(DATE_COLUMN) {
            return Ok(None);
        }
        let dates: Vec<NaiveDate> = self.dates()?.into_iter().flatten().collect();
        Ok(dates
            .iter()
            .min()
            .copied()
            .zip(dates.iter().max().copied()))
    }

    /// Rows as records. Rows without a date or a category are skipped;
    /// missing parameter columns read as absent.
    pub fn to_records(&self) -> Result<Vec<ParameterRecord>, StoreError> {
        if !self.has_column(DATE_COLUMN) || !self.has_column(TYPE_COLUMN) {
            return Ok(Vec::new());
        }
        let dates = self.dates()?;
        let types = self
            .frame
            .column(TYPE_COLUMN)
            .map_err(frame_err("type column"))?
            .str()
            .map_err(frame_err("type column type"))?;

        let mut values = Vec::with_capacity(VALUE_COLUMNS.len());
        for name in VALUE_COLUMNS {
            let ca = match self.frame.column(name) {
                Ok(column) => Some(column.f64().map_err(frame_err(name))?),
                Err(_) => None,
            };
            values.push(ca);
        }
        let value_at = |col: usize, row: usize| values[col].and_then(|ca| ca.get(row));

        let mut records = Vec::with_capacity(self.frame.height());
        for (i, date) in dates.into_iter().enumerate() {
            let (Some(date), Some(curve_type)) = (date, types.get(i)) else {
                continue;
            };
            records.push(ParameterRecord {
                date,
                curve_type: curve_type.to_string(),
                b1: value_at(0, i),
                b2: value_at(1, i),
                b3: value_at(2, i),
                b4: value_at(3, i),
                l1: value_at(4, i),
                l2: value_at(5, i),
            });
        }
        Ok(records)
    }

    /// `self ∪ incoming`, fully identical rows dropped (first kept), stable
    /// sort by date with null dates last.
    ///
    /// Columns are the canonical schema followed by any extra columns of
    /// either side; a side lacking a column contributes nulls.
    pub fn merge(&self, incoming: &Dataset) -> Result<Dataset, StoreError> {
        let columns = union_columns(&self.frame, &incoming.frame);
        let mut combined = conform(&self.frame, &columns)?;
        let incoming = conform(&incoming.frame, &columns)?;
        combined
            .vstack_mut(&incoming)
            .map_err(frame_err("concatenate"))?;

        let merged = combined
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .sort(
                [DATE_COLUMN],
                SortMultipleOptions::default()
                    .with_maintain_order(true)
                    .with_nulls_last(true),
            )
            .collect()
            .map_err(frame_err("deduplicate and sort"))?;

        Ok(Self { frame: merged })
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

fn union_columns(left: &DataFrame, right: &DataFrame) -> Vec<(PlSmallStr, DataType)> {
    let mut columns: Vec<(PlSmallStr, DataType)> = ParameterSchema::schema()
        .iter_fields()
        .map(|f| (f.name().clone(), f.dtype().clone()))
        .collect();

    for column in left.get_columns().iter().chain(right.get_columns()) {
        if !columns.iter().any(|(name, _)| name == column.name()) {
            columns.push((column.name().clone(), column.dtype().clone()));
        }
    }
    columns
}

/// Reshape `frame` to `columns`. Casts are strict: a stored value that does
/// not convert fails the merge instead of turning into a null.
fn conform(frame: &DataFrame, columns: &[(PlSmallStr, DataType)]) -> Result<DataFrame, StoreError> {
    let height = frame.height();
    let mut out = Vec::with_capacity(columns.len());
    for (name, dtype) in columns {
        let column = match frame.column(name.as_str()) {
            Ok(existing) => existing
                .as_materialized_series()
                .strict_cast(dtype)
                .map(Column::from)
                .map_err(|e| {
                    StoreError::Frame(format!(
                        "column '{name}' ({}) does not convert to {dtype}: {e}",
                        existing.dtype()
                    ))
                })?,
            Err(_) => Series::full_null(name.clone(), height, dtype).into(),
        };
        out.push(column);
    }
    DataFrame::new(out).map_err(frame_err("schema alignment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(date: NaiveDate, curve_type: &str, b1: f64) -> ParameterRecord {
        ParameterRecord {
            b1: Some(b1),
            l1: Some(1.5),
            ..ParameterRecord::empty(date, curve_type)
        }
    }

    #[test]
    fn epoch_conversion() {
        assert_eq!(to_epoch_days(d(1970, 1, 1)), 0);
        assert_eq!(to_epoch_days(d(2025, 3, 11)), 20158);
        assert_eq!(from_epoch_days(20158), Some(d(2025, 3, 11)));
        assert_eq!(from_epoch_days(-1), Some(d(1969, 12, 31)));
    }

    #[test]
    fn from_records_builds_canonical_frame() {
        let ds = Dataset::from_records(&[record(d(2025, 3, 11), "pre", 0.14)]).unwrap();
        assert_eq!(ds.height(), 1);
        assert!(ParameterSchema::validate(ds.frame()).is_ok());
        assert!(ds.contains_date(d(2025, 3, 11)).unwrap());
        assert!(!ds.contains_date(d(2025, 3, 10)).unwrap());
    }

    #[test]
    fn records_survive_the_frame() {
        let records = vec![
            record(d(2025, 3, 10), "pre", 0.14),
            ParameterRecord::empty(d(2025, 3, 10), "ipca"),
        ];
        let ds = Dataset::from_records(&records).unwrap();
        assert_eq!(ds.to_records().unwrap(), records);
    }

    #[test]
    fn merge_sorts_by_date_and_appends() {
        let existing = Dataset::from_records(&[
            record(d(2025, 3, 10), "pre", 0.2),
            record(d(2025, 3, 6), "pre", 0.1),
        ])
        .unwrap();
        let incoming = Dataset::from_records(&[record(d(2025, 3, 11), "pre", 0.3)]).unwrap();

        let merged = existing.merge(&incoming).unwrap();
        let dates: Vec<_> = merged.dates().unwrap().into_iter().flatten().collect();
        assert_eq!(dates, vec![d(2025, 3, 6), d(2025, 3, 10), d(2025, 3, 11)]);
    }

    #[test]
    fn merge_keeps_rows_of_one_date_in_insertion_order() {
        let incoming = Dataset::from_records(&[
            record(d(2025, 3, 11), "pre", 0.3),
            record(d(2025, 3, 11), "ipca", 0.07),
        ])
        .unwrap();
        let merged = Dataset::empty().merge(&incoming).unwrap();
        let types: Vec<_> = merged
            .to_records()
            .unwrap()
            .into_iter()
            .map(|r| r.curve_type)
            .collect();
        assert_eq!(types, vec!["pre", "ipca"]);
    }

    #[test]
    fn merge_drops_fully_identical_rows() {
        let a = Dataset::from_records(&[record(d(2025, 3, 10), "pre", 0.2)]).unwrap();
        let b = Dataset::from_records(&[
            record(d(2025, 3, 10), "pre", 0.2),
            record(d(2025, 3, 10), "pre", 0.25),
        ])
        .unwrap();

        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.height(), 2);
    }

    #[test]
    fn merge_into_empty_yields_canonical_table() {
        let incoming = Dataset::from_records(&[record(d(2025, 3, 11), "pre", 0.3)]).unwrap();
        let merged = Dataset::empty().merge(&incoming).unwrap();
        assert_eq!(merged.height(), 1);
        assert!(ParameterSchema::validate(merged.frame()).is_ok());
    }

    #[test]
    fn merge_preserves_extra_columns_and_fills_missing_dates() {
        let legacy = DataFrame::new(vec![
            Column::new("type".into(), &["pre"]),
            Column::new("b1".into(), &[0.11f64]),
            Column::new("note".into(), &["manual"]),
        ])
        .unwrap();
        let existing = Dataset::from_frame(legacy).unwrap();
        assert!(!existing.has_column("date"));

        let incoming = Dataset::from_records(&[record(d(2025, 3, 11), "pre", 0.3)]).unwrap();
        let merged = existing.merge(&incoming).unwrap();

        assert_eq!(merged.height(), 2);
        assert!(merged.has_column("note"));
        // Dated row first, undated legacy row last
        assert_eq!(
            merged.dates().unwrap(),
            vec![Some(d(2025, 3, 11)), None]
        );
        assert_eq!(merged.to_records().unwrap().len(), 1);
    }

    fn legacy_frame(b1: Column) -> Dataset {
        let date = Column::new("date".into(), &[to_epoch_days(d(2025, 3, 10))])
            .cast(&DataType::Date)
            .unwrap();
        let frame = DataFrame::new(vec![date, Column::new("type".into(), &["pre"]), b1]).unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    #[test]
    fn merge_fails_rather_than_nulling_unconvertible_values() {
        let existing = legacy_frame(Column::new("b1".into(), &["0,1425"]));
        let incoming = Dataset::from_records(&[record(d(2025, 3, 11), "pre", 0.3)]).unwrap();

        let err = existing.merge(&incoming).unwrap_err();
        assert!(matches!(err, StoreError::Frame(ref msg) if msg.contains("b1")));
        // The stored value is untouched
        let b1 = existing.frame().column("b1").unwrap();
        assert_eq!(b1.str().unwrap().get(0), Some("0,1425"));
    }

    #[test]
    fn merge_widens_integer_parameters() {
        let existing = legacy_frame(Column::new("b1".into(), &[2i64]));
        let incoming = Dataset::from_records(&[record(d(2025, 3, 11), "pre", 0.3)]).unwrap();

        let merged = existing.merge(&incoming).unwrap();
        let b1: Vec<_> = merged.to_records().unwrap().into_iter().map(|r| r.b1).collect();
        assert_eq!(b1, vec![Some(2.0), Some(0.3)]);
    }

    #[test]
    fn legacy_timestamp_dates_are_normalized() {
        let millis = 20158i64 * 86_400_000;
        let date = Column::new("date".into(), &[millis])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let frame = DataFrame::new(vec![date, Column::new("type".into(), &["pre"])]).unwrap();

        let ds = Dataset::from_frame(frame).unwrap();
        assert_eq!(ds.frame().column("date").unwrap().dtype(), &DataType::Date);
        assert!(ds.contains_date(d(2025, 3, 11)).unwrap());
    }

    #[test]
    fn string_dates_are_rejected() {
        let frame = DataFrame::new(vec![Column::new("date".into(), &["2025-03-11"])]).unwrap();
        assert!(Dataset::from_frame(frame).is_err());
    }

    #[test]
    fn date_bounds_ignore_nulls() {
        let ds = Dataset::from_records(&[
            record(d(2025, 3, 10), "pre", 0.2),
            record(d(2025, 2, 28), "pre", 0.1),
        ])
        .unwrap();
        assert_eq!(
            ds.date_bounds().unwrap(),
            Some((d(2025, 2, 28), d(2025, 3, 10)))
        );
        assert_eq!(Dataset::empty().date_bounds().unwrap(), None);
    }
}

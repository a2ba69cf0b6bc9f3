//! Single-file dataset store.
//!
//! - Format chosen by extension: Feather/Arrow IPC or Parquet
//! - Atomic writes (write to `<file>.tmp`, rename into place)
//! - Metadata sidecar `<file>.meta.json` (row count, date range, hash)

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::dataset::Dataset;
use super::schema::ParameterSchema;
use super::{DatasetStore, StoreError};

/// On-disk encoding of the dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Arrow IPC file (Feather v2).
    Feather,
    Parquet,
}

impl StoreFormat {
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "feather" | "arrow" | "ipc" => Ok(StoreFormat::Feather),
            "parquet" => Ok(StoreFormat::Parquet),
            _ => Err(StoreError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Metadata sidecar written next to the dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub row_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// BLAKE3 of the dataset file bytes.
    pub data_hash: String,
    pub format: StoreFormat,
    pub written_at: NaiveDateTime,
}

/// Dataset persisted as one file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    format: StoreFormat,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let format = StoreFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `<file><suffix>` in the same directory.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.sibling(".meta.json")
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Read the sidecar, if present and parseable.
    pub fn meta(&self) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_meta(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let bytes = fs::read(&self.path)
            .map_err(|e| StoreError::Io(format!("hash read: {e}")))?;
        let bounds = dataset.date_bounds()?;
        let meta = StoreMeta {
            row_count: dataset.height(),
            start_date: bounds.map(|(first, _)| first),
            end_date: bounds.map(|(_, last)| last),
            data_hash: blake3::hash(&bytes).to_hex().to_string(),
            format: self.format,
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| StoreError::Io(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(), meta_json)
            .map_err(|e| StoreError::Io(format!("meta write: {e}")))?;
        Ok(())
    }
}

impl DatasetStore for FileStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Option<Dataset>, StoreError> {
        if !self.exists() {
            return Ok(None);
        }
        let frame = read_frame(&self.path, self.format)?;
        let dataset = Dataset::from_frame(frame)?;
        if let Err(e) = ParameterSchema::validate(dataset.frame()) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "dataset does not match the parameter schema"
            );
        }
        debug!(path = %self.path.display(), rows = dataset.height(), "dataset loaded");
        Ok(Some(dataset))
    }

    fn write(&self, dataset: &Dataset) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("create {}: {e}", parent.display())))?;
        }

        replace_atomically(&self.tmp_path(), &self.path, |tmp| {
            write_frame(dataset.frame(), tmp, self.format)
        })?;

        // The dataset is in place; a stale sidecar is only cosmetic.
        if let Err(e) = self.write_meta(dataset) {
            warn!(path = %self.meta_path().display(), error = %e, "failed to write metadata sidecar");
        }
        Ok(())
    }
}

/// Write `tmp_path` with `write`, then rename it over `path`. The temp file
/// never outlives a failure.
fn replace_atomically(
    tmp_path: &Path,
    path: &Path,
    write: impl FnOnce(&Path) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    if let Err(e) = write(tmp_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(e);
    }
    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        StoreError::Io(format!("atomic rename failed: {e}"))
    })
}

fn read_frame(path: &Path, format: StoreFormat) -> Result<DataFrame, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::Io(format!("open: {e}")))?;
    match format {
        StoreFormat::Feather => IpcReader::new(file).finish(),
        StoreFormat::Parquet => ParquetReader::new(file).finish(),
    }
    .map_err(|e| StoreError::Columnar(format!("read {}: {e}", path.display())))
}

fn write_frame(df: &DataFrame, path: &Path, format: StoreFormat) -> Result<(), StoreError> {
    let file = fs::File::create(path).map_err(|e| StoreError::Io(format!("create file: {e}")))?;
    let mut df = df.clone();
    match format {
        StoreFormat::Feather => IpcWriter::new(file).finish(&mut df),
        StoreFormat::Parquet => ParquetWriter::new(file).finish(&mut df).map(|_| ()),
    }
    .map_err(|e| StoreError::Columnar(format!("write {}: {e}", path.display())))
}

//! Persistence for the parameter dataset.
//!
//! The whole table is read at the start of an update and rewritten at the
//! end; there is no incremental append.

pub mod dataset;
pub mod file_store;
pub mod memory;
pub mod schema;

pub use dataset::Dataset;
pub use file_store::{FileStore, StoreFormat, StoreMeta};
pub use memory::MemoryStore;
pub use schema::{ParameterSchema, SchemaError, DATE_COLUMN, TYPE_COLUMN, VALUE_COLUMNS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),

    #[error("columnar file error: {0}")]
    Columnar(String),

    #[error("unsupported dataset file extension: {0}")]
    UnsupportedFormat(String),

    #[error("dataset error: {0}")]
    Frame(String),
}

/// Load-all / write-all table storage.
pub trait DatasetStore: Send + Sync {
    /// Where the data lives, for logs.
    fn describe(&self) -> String;

    /// The stored table, or `None` if nothing has been written yet.
    fn load(&self) -> Result<Option<Dataset>, StoreError>;

    /// Replace the stored table.
    fn write(&self, dataset: &Dataset) -> Result<(), StoreError>;

    /// Rows currently stored; zero when nothing is stored.
    fn row_count(&self) -> Result<usize, StoreError> {
        Ok(self.load()?.map(|d| d.height()).unwrap_or(0))
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::dataset::Dataset;
use super::{DatasetStore, StoreError};

/// Dataset held in process memory. Counts loads and writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    dataset: Mutex<Option<Dataset>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            dataset: Mutex::new(Some(dataset)),
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Current contents without counting a read.
    pub fn snapshot(&self) -> Option<Dataset> {
        self.dataset.lock().ok().and_then(|guard| guard.clone())
    }
}

impl DatasetStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<Option<Dataset>, StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let guard = self
            .dataset
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn write(&self, dataset: &Dataset) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut guard = self
            .dataset
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".into()))?;
        *guard = Some(dataset.clone());
        Ok(())
    }
}

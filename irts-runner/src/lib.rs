//! IRTS Runner: keeps the ANBIMA parameter dataset current.
//!
//! This crate builds on `irts-core` to provide:
//! - Date validation against the business-day calendar
//! - The load → check → fetch → merge → write update flow
//! - TOML runner configuration
//! - Wiring from configuration to concrete source, store and calendar

pub mod config;
pub mod manager;
pub mod runner;

pub use config::{ConfigError, HolidayConfig, RunnerConfig, SourceConfig};
pub use manager::{IrtsManager, ManagerError, SkipReason, UpdateOutcome, DEFAULT_STALENESS_WINDOW};
pub use runner::{
    build_calendar, build_source, build_store, run_update, run_update_with, store_status,
    RunError, StoreStatus, UpdateReport,
};

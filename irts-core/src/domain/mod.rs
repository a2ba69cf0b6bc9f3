//! Domain types.

pub mod record;

pub use record::ParameterRecord;

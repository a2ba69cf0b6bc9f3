//! Where parameter records come from.
//!
//! - [`provider`]: the [`ParameterSource`] seam and [`SourceError`]
//! - [`anbima`]: the HTTP + XML implementation
//! - [`normalize`]: category renames and comma-decimal parsing

pub mod anbima;
pub mod normalize;
pub mod provider;

pub use anbima::{parse_parameters, AnbimaSource, RetryPolicy, ANBIMA_IRTS_URL};
pub use normalize::{parse_decimal_comma, rename_category, CATEGORY_RENAMES};
pub use provider::{ParameterSource, SourceError};

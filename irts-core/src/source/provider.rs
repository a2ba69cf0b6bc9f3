//! Parameter source trait and structured error types.
//!
//! The manager only sees [`ParameterSource`], so the ANBIMA fetcher can be
//! swapped for a stub in tests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::ParameterRecord;

/// Errors from fetching and parsing published parameters.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("source error: {0}")]
    Other(String),
}

impl SourceError {
    /// Transport failures and bad statuses are worth another attempt; a body
    /// that does not parse will not get better.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::NetworkUnreachable(_) | SourceError::HttpStatus { .. }
        )
    }
}

/// Anything that can produce the parameter records for one reference date.
pub trait ParameterSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch and normalize every record published for `date`.
    fn fetch(&self, date: NaiveDate) -> Result<Vec<ParameterRecord>, SourceError>;
}

//! ANBIMA term-structure parameter download.
//!
//! The endpoint takes a form POST with the reference date and answers with an
//! XML document holding one `PARAMETRO` element per curve category:
//!
//! ```xml
//! <PARAMETRO Grupo="PREFIXADOS" B1="0,1425" B2="-0,0317" ... L1="1,6" L2="0,2" />
//! ```

use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::normalize::{parse_decimal_comma, rename_category};
use super::provider::{ParameterSource, SourceError};
use crate::domain::ParameterRecord;

/// Default download endpoint.
pub const ANBIMA_IRTS_URL: &str = "https://www.anbima.com.br/informacoes/est-termo/CZ-down.asp";

const PARAM_ELEMENT: &str = "PARAMETRO";
const GROUP_ATTR: &str = "Grupo";

/// Fixed-delay retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Fetches parameters from ANBIMA.
pub struct AnbimaSource {
    client: reqwest::blocking::Client,
    url: String,
    retry: RetryPolicy,
}

impl AnbimaSource {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            retry,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Reference date as the form expects it.
    fn form_date(date: NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }

    /// POST the form, retrying transport errors and bad statuses.
    fn download_with_retry(&self, date: NaiveDate) -> Result<Vec<u8>, SourceError> {
        let date_field = Self::form_date(date);
        let form = [("Idioma", "PT"), ("Dt_Ref", date_field.as_str()), ("saida", "xml")];
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                std::thread::sleep(self.retry.delay);
            }

            match self.download_once(&form) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() => {
                    warn!(
                        %date,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "IRTS download attempt failed"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::Other("max retries exceeded".into())))
    }

    fn download_once(&self, form: &[(&str, &str)]) -> Result<Vec<u8>, SourceError> {
        let resp = self
            .client
            .post(&self.url)
            .form(form)
            .send()
            .map_err(|e| SourceError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| SourceError::NetworkUnreachable(format!("failed to read body: {e}")))
    }
}

impl ParameterSource for AnbimaSource {
    fn name(&self) -> &str {
        "anbima_irts"
    }

    fn fetch(&self, date: NaiveDate) -> Result<Vec<ParameterRecord>, SourceError> {
        let body = self.download_with_retry(date)?;
        debug!(%date, bytes = body.len(), "IRTS response received");
        let text = String::from_utf8_lossy(&body);
        parse_parameters(&text, date)
    }
}

/// Turn the XML response into records stamped with `date`.
///
/// Every `PARAMETRO` element anywhere in the document is one record. A
/// missing numeric attribute is absent; an element without `Grupo` is skipped.
pub fn parse_parameters(xml: &str, date: NaiveDate) -> Result<Vec<ParameterRecord>, SourceError> {
    let doc = roxmltree::Document::parse(xml.trim_start_matches('\u{feff}'))
        .map_err(|e| SourceError::ResponseFormatChanged(format!("invalid XML: {e}")))?;

    let mut records = Vec::new();
    for node in doc.descendants().filter(|n| n.has_tag_name(PARAM_ELEMENT)) {
        let Some(group) = node.attribute(GROUP_ATTR) else {
            warn!(%date, "{PARAM_ELEMENT} element without {GROUP_ATTR}, skipping");
            continue;
        };

        let value = |name: &str| -> Result<Option<f64>, SourceError> {
            let raw = node.attribute(name).unwrap_or("");
            parse_decimal_comma(raw).map_err(|e| {
                SourceError::ResponseFormatChanged(format!("{group} {name}={raw:?}: {e}"))
            })
        };

        records.push(ParameterRecord {
            date,
            curve_type: rename_category(group),
            b1: value("B1")?,
            b2: value("B2")?,
            b3: value("B3")?,
            b4: value("B4")?,
            l1: value("L1")?,
            l2: value("L2")?,
        });
    }

    Ok(records)
}

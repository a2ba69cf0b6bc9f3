//! Runner configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! data_dir = "data/scraped/anbima"
//! dataset_file = "irts_params.feather"
//! timezone = "America/Sao_Paulo"
//! staleness_window = 5
//!
//! [source]
//! url = "https://www.anbima.com.br/informacoes/est-termo/CZ-down.asp"
//! max_attempts = 5
//! retry_delay_ms = 1000
//! timeout_secs = 30
//!
//! [holidays]
//! url = "https://www.anbima.com.br/feriados/arqs/feriados_nacionais.xls"
//! # file = "holidays.csv"   # local list, takes precedence over url
//! timeout_secs = 15
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use irts_core::calendar::ANBIMA_HOLIDAYS_URL;
use irts_core::source::{RetryPolicy, ANBIMA_IRTS_URL};

use crate::manager::DEFAULT_STALENESS_WINDOW;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config TOML: {0}")]
    Parse(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory holding the dataset file.
    pub data_dir: PathBuf,
    /// Dataset file name; the extension picks the format.
    pub dataset_file: String,
    /// IANA timezone that defines "today".
    pub timezone: String,
    /// Oldest accepted date, in business-day steps before today.
    pub staleness_window: usize,
    pub source: SourceConfig,
    pub holidays: HolidayConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/scraped/anbima"),
            dataset_file: "irts_params.feather".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            staleness_window: DEFAULT_STALENESS_WINDOW,
            source: SourceConfig::default(),
            holidays: HolidayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            url: ANBIMA_IRTS_URL.to_string(),
            max_attempts: retry.max_attempts,
            retry_delay_ms: retry.delay.as_millis() as u64,
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayConfig {
    pub url: String,
    /// Local CSV holiday list; used instead of `url` when set.
    pub file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            url: ANBIMA_HOLIDAYS_URL.to_string(),
            file: None,
            timeout_secs: 15,
        }
    }
}

impl HolidayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RunnerConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        if self.dataset_file.trim().is_empty() {
            return Err(ConfigError::Invalid("dataset_file is empty".into()));
        }
        if self.source.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "source.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(&self.dataset_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = RunnerConfig::from_toml("").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(
            config.dataset_path(),
            PathBuf::from("data/scraped/anbima/irts_params.feather")
        );
        assert_eq!(config.staleness_window, 5);
        assert_eq!(config.source.retry_policy(), RetryPolicy::default());
        assert_eq!(config.holidays.timeout(), Duration::from_secs(15));
        assert_eq!(config.tz().unwrap(), chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let config = RunnerConfig::from_toml(
            r#"
            data_dir = "/var/lib/irts"
            staleness_window = 10

            [source]
            max_attempts = 2

            [holidays]
            file = "feriados.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/irts"));
        assert_eq!(config.staleness_window, 10);
        assert_eq!(config.source.max_attempts, 2);
        assert_eq!(config.source.retry_delay_ms, 1000);
        assert_eq!(config.source.url, ANBIMA_IRTS_URL);
        assert_eq!(config.holidays.file, Some(PathBuf::from("feriados.csv")));
        assert_eq!(config.holidays.url, ANBIMA_HOLIDAYS_URL);
    }

    #[test]
    fn unknown_timezone_rejected() {
        let err = RunnerConfig::from_toml(r#"timezone = "Mars/Olympus_Mons""#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimezone(_)));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = RunnerConfig::from_toml("[source]\nmax_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = RunnerConfig::from_toml("staleness_window = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("irts.toml");
        std::fs::write(&path, "dataset_file = \"irts_params.parquet\"\n").unwrap();

        let config = RunnerConfig::from_file(&path).unwrap();
        assert_eq!(config.dataset_file, "irts_params.parquet");

        let missing = RunnerConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn toml_roundtrip() {
        let config = RunnerConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(RunnerConfig::from_toml(&text).unwrap(), config);
    }
}

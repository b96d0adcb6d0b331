//! Core configuration types for registry lookups
//!
//! Durations are stored as fractional seconds so that configuration files stay
//! readable (`"min_delay": 1.5`). The getters in `getters.rs` hand out
//! `Duration`s.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::utils::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_DIR, DEFAULT_CACHE_EXPIRY_DAYS, DEFAULT_CACHE_MAX_SIZE_MB,
    DEFAULT_COOLDOWN_CHUNK_SECS, DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_REQUESTS,
    DEFAULT_MIN_DELAY_SECS, DEFAULT_REQUEST_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_DELAY_SECS, DEFAULT_TIME_WINDOW_SECS,
};

/// Main configuration struct for the lookup client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Requests admitted per sliding window
    pub(crate) max_requests: usize,
    pub(crate) time_window: f64,
    pub(crate) min_delay: f64,
    pub(crate) max_delay: f64,
    pub(crate) use_random_delay: bool,
    pub(crate) request_timeout: f64,
    /// Total attempts per fetch, the first one included
    pub(crate) request_retries: u32,
    pub(crate) retry_delay: f64,
    pub(crate) cache_enabled: bool,
    pub(crate) cache_dir: PathBuf,
    pub(crate) cache_expiry_days: u32,
    pub(crate) cache_max_size_mb: f64,
    pub(crate) cache_enable_cleanup: bool,
    pub(crate) base_url: String,
    /// Granularity of cancellation checks while cooling down
    pub(crate) cooldown_chunk: f64,
    pub(crate) fetch_details_for_names: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            time_window: DEFAULT_TIME_WINDOW_SECS,
            min_delay: DEFAULT_MIN_DELAY_SECS,
            max_delay: DEFAULT_MAX_DELAY_SECS,
            use_random_delay: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            request_retries: DEFAULT_REQUEST_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            cache_enabled: true,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_expiry_days: DEFAULT_CACHE_EXPIRY_DAYS,
            cache_max_size_mb: DEFAULT_CACHE_MAX_SIZE_MB,
            cache_enable_cleanup: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            cooldown_chunk: DEFAULT_COOLDOWN_CHUNK_SECS,
            fetch_details_for_names: false,
        }
    }
}

impl LookupConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Missing keys take their defaults. The result is validated the same way
    /// the builder validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read, is not valid JSON,
    /// or holds out-of-range values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: LookupConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is within range
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
            ConfigError::InvalidValue {
                field,
                message: message.into(),
            }
        }

        fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(invalid(field, format!("must be a non-negative number, got {value}")))
            }
        }

        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid(field, format!("must be a positive number, got {value}")))
            }
        }

        if self.max_requests == 0 {
            return Err(invalid("max_requests", "must be at least 1"));
        }
        positive("time_window", self.time_window)?;
        non_negative("min_delay", self.min_delay)?;
        non_negative("max_delay", self.max_delay)?;
        if self.max_delay < self.min_delay {
            return Err(invalid(
                "max_delay",
                format!(
                    "must not be smaller than min_delay ({} < {})",
                    self.max_delay, self.min_delay
                ),
            ));
        }
        positive("request_timeout", self.request_timeout)?;
        if self.request_retries == 0 {
            return Err(invalid("request_retries", "must be at least 1"));
        }
        non_negative("retry_delay", self.retry_delay)?;
        if self.cache_expiry_days == 0 {
            return Err(invalid("cache_expiry_days", "must be at least 1"));
        }
        positive("cache_max_size_mb", self.cache_max_size_mb)?;
        positive("cooldown_chunk", self.cooldown_chunk)?;

        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            Ok(url) => Err(invalid(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => Err(invalid("base_url", e.to_string())),
        }
    }
}

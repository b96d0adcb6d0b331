//! Fluent builder for `LookupConfig`
//!
//! Every setter takes the value as-is; `build()` runs the range checks once so
//! callers get a single error naming the offending field.

use std::path::PathBuf;

use super::types::LookupConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default)]
pub struct LookupConfigBuilder {
    config: LookupConfig,
}

impl LookupConfig {
    #[must_use]
    pub fn builder() -> LookupConfigBuilder {
        LookupConfigBuilder::default()
    }

    /// Builder seeded with this configuration
    #[must_use]
    pub fn into_builder(self) -> LookupConfigBuilder {
        LookupConfigBuilder { config: self }
    }
}

impl LookupConfigBuilder {
    #[must_use]
    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    /// Sliding window length in seconds
    #[must_use]
    pub fn time_window(mut self, seconds: f64) -> Self {
        self.config.time_window = seconds;
        self
    }

    #[must_use]
    pub fn min_delay(mut self, seconds: f64) -> Self {
        self.config.min_delay = seconds;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, seconds: f64) -> Self {
        self.config.max_delay = seconds;
        self
    }

    #[must_use]
    pub fn use_random_delay(mut self, enabled: bool) -> Self {
        self.config.use_random_delay = enabled;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, seconds: f64) -> Self {
        self.config.request_timeout = seconds;
        self
    }

    #[must_use]
    pub fn request_retries(mut self, attempts: u32) -> Self {
        self.config.request_retries = attempts;
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, seconds: f64) -> Self {
        self.config.retry_delay = seconds;
        self
    }

    #[must_use]
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    #[must_use]
    pub fn cache_expiry_days(mut self, days: u32) -> Self {
        self.config.cache_expiry_days = days;
        self
    }

    #[must_use]
    pub fn cache_max_size_mb(mut self, megabytes: f64) -> Self {
        self.config.cache_max_size_mb = megabytes;
        self
    }

    #[must_use]
    pub fn cache_enable_cleanup(mut self, enabled: bool) -> Self {
        self.config.cache_enable_cleanup = enabled;
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn cooldown_chunk(mut self, seconds: f64) -> Self {
        self.config.cooldown_chunk = seconds;
        self
    }

    #[must_use]
    pub fn fetch_details_for_names(mut self, enabled: bool) -> Self {
        self.config.fetch_details_for_names = enabled;
        self
    }

    /// Validate and produce the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a value is out of range.
    pub fn build(self) -> Result<LookupConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

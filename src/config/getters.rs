//! Getter methods for `LookupConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `LookupConfig` instance.

use std::path::Path;
use std::time::Duration;

use super::types::LookupConfig;

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl LookupConfig {
    #[must_use]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    #[must_use]
    pub fn time_window(&self) -> Duration {
        secs(self.time_window)
    }

    #[must_use]
    pub fn min_delay(&self) -> Duration {
        secs(self.min_delay)
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        secs(self.max_delay)
    }

    #[must_use]
    pub fn use_random_delay(&self) -> bool {
        self.use_random_delay
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout)
    }

    #[must_use]
    pub fn request_retries(&self) -> u32 {
        self.request_retries
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        secs(self.retry_delay)
    }

    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn cache_expiry_days(&self) -> u32 {
        self.cache_expiry_days
    }

    #[must_use]
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache_expiry_days) * 24 * 60 * 60)
    }

    #[must_use]
    pub fn cache_max_size_mb(&self) -> f64 {
        self.cache_max_size_mb
    }

    #[must_use]
    pub fn cache_max_size_bytes(&self) -> u64 {
        (self.cache_max_size_mb * 1024.0 * 1024.0) as u64
    }

    #[must_use]
    pub fn cache_enable_cleanup(&self) -> bool {
        self.cache_enable_cleanup
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn cooldown_chunk(&self) -> Duration {
        secs(self.cooldown_chunk)
    }

    #[must_use]
    pub fn fetch_details_for_names(&self) -> bool {
        self.fetch_details_for_names
    }
}

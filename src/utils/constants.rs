//! Shared configuration constants for masothue
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Portal root that search and detail paths are joined onto
pub const DEFAULT_BASE_URL: &str = "https://masothue.com";

/// Path of the portal's search page
pub const SEARCH_PATH: &str = "/Search/";

/// Default rate: 10 requests per 60 second window
///
/// The portal starts answering 429 and serving CAPTCHA pages well above
/// this rate from a single address.
pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_TIME_WINDOW_SECS: f64 = 60.0;

/// Spacing between consecutive requests, drawn uniformly from
/// `[min_delay, max_delay]` when random delays are enabled
pub const DEFAULT_MIN_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 3.0;

/// Extra slack added when waiting for a window slot to expire
pub const WINDOW_RELEASE_MARGIN_MS: u64 = 100;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 8.0;

/// Total attempts per fetch, including the first one
pub const DEFAULT_REQUEST_RETRIES: u32 = 2;

/// Base of the linear backoff: attempt `n` waits `n * retry_delay`
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;

/// Cooldown when a 403/429 response carries no usable `Retry-After`
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

/// A 403 usually means the address is flagged; wait at least this long
pub const FORBIDDEN_COOLDOWN_FLOOR_SECS: u64 = 60;

/// Cooldown sleeps are split into chunks of this length so cancellation
/// is noticed promptly
pub const DEFAULT_COOLDOWN_CHUNK_SECS: f64 = 5.0;

pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_CACHE_EXPIRY_DAYS: u32 = 7;
pub const DEFAULT_CACHE_MAX_SIZE_MB: f64 = 100.0;

/// Queries are cut to this many characters before being sent
pub const MAX_QUERY_LENGTH: usize = 200;

/// Desktop browser user agents the HTTP session rotates through
///
/// A new one is picked whenever the session is reset after a soft ban.
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/122.0.0.0",
];

pub const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_LANGUAGE_HEADER: &str = "vi-VN,vi;q=0.9,en;q=0.8";

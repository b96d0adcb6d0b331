//! Registry lookups against masothue.com
//!
//! [`LookupClient`] searches by tax code or company name, fetches detail
//! pages through a rate-limited, cooldown-aware [`Fetcher`], extracts the
//! registry fields and keeps them in an on-disk [`ResultCache`].
//! [`BatchRunner`] drives many lookups with progress reporting.

pub mod batch;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetch_engine;
pub mod models;
pub mod utils;

pub use batch::{BatchObserver, BatchOutcome, BatchRow, BatchRunner, NoOpObserver, dedup_queries};
pub use cache::{PruneStats, ResultCache, cache_key};
pub use client::LookupClient;
pub use config::{LookupConfig, LookupConfigBuilder};
pub use error::{ConfigError, LookupError, LookupResult};
pub use extractor::{extract_details, extract_search_results};
pub use fetch_engine::{
    CancellationSignal, CooldownState, FetchedPage, Fetcher, NeverCancel, RateLimiter,
    RateLimiterMetrics, is_blocked,
};
pub use models::{DetailFields, FieldName, SearchResult};

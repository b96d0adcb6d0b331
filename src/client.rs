//! Lookup client
//!
//! Owns the fetcher (HTTP session, network lock and rate limiter) and the
//! optional result cache, and chains search, detail fetch and merge.

use tracing::{debug, info, warn};

use crate::cache::{ResultCache, cache_key};
use crate::config::LookupConfig;
use crate::error::{LookupError, LookupResult};
use crate::extractor::{extract_details, extract_search_results};
use crate::fetch_engine::{CancellationSignal, Fetcher, RateLimiter};
use crate::models::{DetailFields, SearchResult};
use crate::utils::{SEARCH_PATH, is_tax_code_query, sanitize_query};

/// Query parameters of a search page request
fn search_params(query: &str, page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.to_string()), ("type", "auto".to_string())];
    if page > 1 {
        params.push(("page", page.to_string()));
    }
    params
}

/// Entry point for registry lookups
pub struct LookupClient {
    config: LookupConfig,
    fetcher: Fetcher,
    cache: Option<ResultCache>,
}

impl LookupClient {
    /// # Errors
    ///
    /// Returns `LookupError::Config` for an invalid configuration and
    /// `LookupError::Network` when the HTTP client cannot be built.
    pub fn new(config: LookupConfig) -> LookupResult<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        let cache = config
            .cache_enabled()
            .then(|| ResultCache::from_config(&config));

        info!(
            base_url = %fetcher.base_url(),
            cache = cache.is_some(),
            max_requests = config.max_requests(),
            "Lookup client ready"
        );
        Ok(Self {
            config,
            fetcher,
            cache,
        })
    }

    #[must_use]
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        self.fetcher.rate_limiter()
    }

    /// First page of results for `query`.
    ///
    /// An all-digit query is treated as a tax code: the result holds at most
    /// the exact match, with its details merged. Name queries return every
    /// candidate, detail-merged only when `fetch_details_for_names` is set.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty query, otherwise whatever the fetcher
    /// reports for the search page. Detail failures other than `Cancelled`
    /// and `Blocked` are logged and leave the result unmerged.
    pub async fn lookup(
        &self,
        query: &str,
        cancel: &dyn CancellationSignal,
    ) -> LookupResult<Vec<SearchResult>> {
        self.lookup_page(query, 1, cancel).await
    }

    /// Same as [`lookup`](Self::lookup) for a given results page (1-based)
    ///
    /// # Errors
    ///
    /// See [`lookup`](Self::lookup).
    pub async fn lookup_page(
        &self,
        query: &str,
        page: u32,
        cancel: &dyn CancellationSignal,
    ) -> LookupResult<Vec<SearchResult>> {
        let query = sanitize_query(query)?;
        let params = search_params(&query, page);

        let fetched = self.fetcher.fetch(SEARCH_PATH, &params, cancel).await?;
        let mut results = extract_search_results(&fetched.body, self.fetcher.base_url());
        debug!(query = %query, page, count = results.len(), "Search page parsed");

        if is_tax_code_query(&query) {
            let Some(mut hit) = results.into_iter().find(|r| r.tax_code == query) else {
                info!(query = %query, "No exact tax code match");
                return Ok(Vec::new());
            };
            self.merge_details_into(&mut hit, cancel).await?;
            return Ok(vec![hit]);
        }

        if self.config.fetch_details_for_names() {
            for result in &mut results {
                self.merge_details_into(result, cancel).await?;
            }
        }
        Ok(results)
    }

    async fn merge_details_into(
        &self,
        result: &mut SearchResult,
        cancel: &dyn CancellationSignal,
    ) -> LookupResult<()> {
        let Some(detail_url) = result.detail_url.clone() else {
            return Ok(());
        };
        match self.fetch_details(&detail_url, cancel).await {
            Ok(details) => {
                result.merge_details(&details);
                Ok(())
            }
            Err(e @ (LookupError::Cancelled | LookupError::Blocked { .. })) => Err(e),
            Err(e) => {
                warn!(url = %detail_url, error = %e, "Failed to fetch details");
                Ok(())
            }
        }
    }

    /// Fields of the detail page at `detail_ref` (absolute URL or path),
    /// served from the cache when fresh.
    ///
    /// # Errors
    ///
    /// Fetcher errors for the detail page. Extraction itself never fails.
    pub async fn fetch_details(
        &self,
        detail_ref: &str,
        cancel: &dyn CancellationSignal,
    ) -> LookupResult<DetailFields> {
        let key = cache_key(detail_ref);
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            debug!(key = %key, "Details served from cache");
            return Ok(cached);
        }

        let page = self.fetcher.fetch(detail_ref, &[], cancel).await?;
        let details = extract_details(&page.body);

        if let Some(cache) = &self.cache {
            if details.is_empty() {
                debug!(key = %key, "Nothing extracted, not caching");
            } else {
                cache.set(&key, &details);
            }
        }
        Ok(details)
    }
}

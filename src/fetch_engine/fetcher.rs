//! Cooldown-aware page fetcher
//!
//! One logical fetch runs up to `request_retries` attempts. Every attempt is
//! admitted by the rate limiter; transport failures and error statuses back
//! off linearly, soft bans (403/429) reset the session and cool down, and a
//! successful page carrying a verification challenge fails fast with
//! `LookupError::Blocked`.

use rand::seq::IndexedRandom;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, RETRY_AFTER};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::block_detector::is_blocked;
use super::cancellation::{CancellationSignal, ensure_active};
use super::cooldown::{CooldownState, sleep_cancellable};
use super::rate_limiter::{RateLimitSettings, RateLimiter};
use crate::config::LookupConfig;
use crate::error::{LookupError, LookupResult};
use crate::utils::{ACCEPT_HEADER, ACCEPT_LANGUAGE_HEADER, USER_AGENTS};

/// A page returned with a success status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Cookie jar and identity used for requests
struct Session {
    client: reqwest::Client,
    user_agent: &'static str,
}

impl Session {
    fn new(timeout: Duration, previous: Option<&'static str>) -> LookupResult<Self> {
        let user_agent = pick_user_agent(previous);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_HEADER));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .cookie_provider(Arc::new(Jar::default()))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| {
                LookupError::network("", None, format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, user_agent })
    }
}

/// Random pool entry, different from `previous` when possible
fn pick_user_agent(previous: Option<&'static str>) -> &'static str {
    let candidates: Vec<&'static str> = USER_AGENTS
        .iter()
        .copied()
        .filter(|ua| Some(*ua) != previous)
        .collect();
    candidates
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Outcome of a single HTTP exchange
enum Attempt {
    Page(FetchedPage),
    SoftBan { status: u16, wait: Duration },
    HttpError { status: u16 },
    Transport(String),
}

/// Fetches portal pages for one client
pub struct Fetcher {
    base_url: Url,
    limiter: RateLimiter,
    /// Held for the whole HTTP exchange: one request in flight per client
    session: Mutex<Session>,
    timeout: Duration,
    attempts: u32,
    retry_delay: Duration,
    cooldown_chunk: Duration,
}

impl Fetcher {
    /// # Errors
    ///
    /// Returns `LookupError::Validation` for an unusable base URL and
    /// `LookupError::Network` when the HTTP client cannot be built.
    pub fn new(config: &LookupConfig) -> LookupResult<Self> {
        let base_url = Url::parse(config.base_url())
            .map_err(|e| LookupError::validation("base_url", e.to_string()))?;
        let session = Session::new(config.request_timeout(), None)?;

        Ok(Self {
            base_url,
            limiter: RateLimiter::new(RateLimitSettings::from(config)),
            session: Mutex::new(session),
            timeout: config.request_timeout(),
            attempts: config.request_retries().max(1),
            retry_delay: config.retry_delay(),
            cooldown_chunk: config.cooldown_chunk(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Absolute URL for `target` with `params` appended to its query.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Validation` when the target cannot be joined
    /// onto the base URL.
    pub fn resolve(&self, target: &str, params: &[(&str, String)]) -> LookupResult<Url> {
        let mut url = match Url::parse(target) {
            Ok(absolute) => absolute,
            Err(_) => self
                .base_url
                .join(target)
                .map_err(|e| LookupError::validation("url", format!("{target}: {e}")))?,
        };
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Fetch `target` (absolute URL or path) with rate limiting, retries,
    /// soft-ban cooldown and challenge detection.
    ///
    /// # Errors
    ///
    /// - `Cancelled` when `cancel` fires at a checkpoint
    /// - `Blocked` when the page is a verification challenge
    /// - `Network` once all attempts failed
    pub async fn fetch(
        &self,
        target: &str,
        params: &[(&str, String)],
        cancel: &dyn CancellationSignal,
    ) -> LookupResult<FetchedPage> {
        let url = self.resolve(target, params)?;
        let url_str = url.to_string();

        for attempt in 1..=self.attempts {
            ensure_active(cancel)?;
            let waited = self.limiter.admit().await;
            if !waited.is_zero() {
                debug!(url = %url_str, waited_ms = waited.as_millis() as u64, "Waited before request");
            }
            ensure_active(cancel)?;

            let last_attempt = attempt == self.attempts;

            match self.attempt(&url).await {
                Attempt::Page(page) => {
                    if is_blocked(&page.body) {
                        warn!(url = %url_str, status = page.status, "Verification challenge served");
                        return Err(LookupError::Blocked {
                            url: url_str,
                            status: page.status,
                        });
                    }
                    return Ok(page);
                }
                Attempt::SoftBan { status, wait } => {
                    warn!(
                        url = %url_str,
                        status,
                        wait_secs = wait.as_secs(),
                        "Soft ban detected, cooling down"
                    );
                    sleep_cancellable(wait, self.cooldown_chunk, cancel).await?;
                    if last_attempt {
                        return Err(LookupError::network(
                            url_str,
                            Some(status),
                            format!("HTTP {status} persisted after cooldown"),
                        ));
                    }
                    info!(url = %url_str, attempt, "Cooldown finished, retrying");
                }
                Attempt::HttpError { status } => {
                    warn!(url = %url_str, status, attempt, "HTTP error status");
                    if last_attempt {
                        return Err(LookupError::network(
                            url_str,
                            Some(status),
                            format!("HTTP {status}"),
                        ));
                    }
                    self.backoff(attempt, cancel).await?;
                }
                Attempt::Transport(message) => {
                    warn!(url = %url_str, attempt, error = %message, "Request failed");
                    if last_attempt {
                        return Err(LookupError::network(url_str, None, message));
                    }
                    self.backoff(attempt, cancel).await?;
                }
            }
        }

        Err(LookupError::network(url_str, None, "no attempt was made"))
    }

    async fn backoff(&self, attempt: u32, cancel: &dyn CancellationSignal) -> LookupResult<()> {
        let delay = self.retry_delay * attempt;
        debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
        sleep_cancellable(delay, self.cooldown_chunk, cancel).await
    }

    /// One GET under the session lock. A soft ban resets the session before
    /// the lock is released.
    async fn attempt(&self, url: &Url) -> Attempt {
        let mut session = self.session.lock().await;

        let response = match session.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(e.to_string()),
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let CooldownState::SoftBanned { wait, status } =
            CooldownState::from_response(status, retry_after.as_deref())
        {
            match Session::new(self.timeout, Some(session.user_agent)) {
                Ok(fresh) => {
                    debug!(user_agent = fresh.user_agent, "Session reset with new identity");
                    *session = fresh;
                }
                Err(e) => warn!(error = %e, "Failed to reset session, keeping current one"),
            }
            return Attempt::SoftBan { status, wait };
        }

        if response.status().is_client_error() || response.status().is_server_error() {
            return Attempt::HttpError { status };
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(body) => Attempt::Page(FetchedPage {
                url: final_url,
                status,
                body,
            }),
            Err(e) => Attempt::Transport(format!("failed to read response body: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> Fetcher {
        let config = LookupConfig::builder()
            .base_url("https://masothue.com")
            .build()
            .unwrap();
        Fetcher::new(&config).unwrap()
    }

    #[test]
    fn test_resolve_joins_paths_and_params() {
        let fetcher = fetcher();
        let url = fetcher
            .resolve("/Search/", &[("q", "công ty a".to_string()), ("type", "auto".to_string())])
            .unwrap();
        assert_eq!(url.path(), "/Search/");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "công ty a".to_string()),
                ("type".to_string(), "auto".to_string())
            ]
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_urls() {
        let fetcher = fetcher();
        let url = fetcher
            .resolve("http://127.0.0.1:9999/0101234567-cong-ty", &[])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/0101234567-cong-ty");
    }

    #[test]
    fn test_pick_user_agent_rotates() {
        for _ in 0..20 {
            let next = pick_user_agent(Some(USER_AGENTS[0]));
            assert_ne!(next, USER_AGENTS[0]);
            assert!(USER_AGENTS.contains(&next));
        }
    }
}

//! Sliding-window rate limiter for the portal
//!
//! Admission combines two rules:
//! - at most `max_requests` admissions inside any `time_window`
//! - a minimum spacing between consecutive admissions, drawn uniformly from
//!   `[min_delay, max_delay]` when random delays are enabled
//!
//! The admission instant is decided and recorded under one lock, then the
//! caller sleeps outside the lock until that instant. Concurrent callers are
//! therefore queued one behind the other instead of racing for a free slot.

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::LookupConfig;
use crate::utils::WINDOW_RELEASE_MARGIN_MS;

/// Limits applied by a `RateLimiter`
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    pub max_requests: usize,
    pub time_window: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub use_random_delay: bool,
}

impl From<&LookupConfig> for RateLimitSettings {
    fn from(config: &LookupConfig) -> Self {
        Self {
            max_requests: config.max_requests(),
            time_window: config.time_window(),
            min_delay: config.min_delay(),
            max_delay: config.max_delay(),
            use_random_delay: config.use_random_delay(),
        }
    }
}

/// Read-only snapshot of limiter activity
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterMetrics {
    /// Admissions currently inside the window
    pub current_rate: usize,
    pub max_requests: usize,
    pub time_window_secs: f64,
    pub requests_per_second: f64,
    /// Mean gap between the admissions inside the window
    pub average_delay_secs: f64,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub use_random_delay: bool,
}

#[derive(Debug, Default)]
struct WindowState {
    /// Admission instants, oldest first
    timestamps: VecDeque<Instant>,
    last_request: Option<Instant>,
}

impl WindowState {
    fn evict(&mut self, now: Instant, window: Duration) {
        while let Some(front) = self.timestamps.front() {
            if now.saturating_duration_since(*front) > window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Decide the admission instant for a request arriving at `now` and
    /// record it.
    fn schedule(
        &mut self,
        now: Instant,
        max_requests: usize,
        window: Duration,
        spacing: Duration,
    ) -> Instant {
        self.evict(now, window);

        let mut admit_at = now;

        if max_requests > 0 && self.timestamps.len() >= max_requests {
            // The slot frees once the max_requests-th most recent admission
            // leaves the window.
            let blocking = self.timestamps[self.timestamps.len() - max_requests];
            let release = blocking + window + Duration::from_millis(WINDOW_RELEASE_MARGIN_MS);
            admit_at = admit_at.max(release);
        }

        if let Some(last) = self.last_request {
            admit_at = admit_at.max(last + spacing);
        }

        self.timestamps.push_back(admit_at);
        self.last_request = Some(admit_at);
        admit_at
    }
}

/// Sliding-window limiter shared by every fetch of one client
#[derive(Debug)]
pub struct RateLimiter {
    settings: RateLimitSettings,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(WindowState::default()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    fn draw_spacing(&self) -> Duration {
        let min = self.settings.min_delay;
        let max = self.settings.max_delay;
        if self.settings.use_random_delay && max > min {
            let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
            Duration::from_secs_f64(secs)
        } else {
            min
        }
    }

    /// Wait until a request may be sent. Returns how long the caller waited.
    pub async fn admit(&self) -> Duration {
        let spacing = self.draw_spacing();
        let (now, admit_at) = {
            let mut state = self.state.lock();
            let now = Instant::now();
            let admit_at = state.schedule(
                now,
                self.settings.max_requests,
                self.settings.time_window,
                spacing,
            );
            (now, admit_at)
        };

        let wait = admit_at.saturating_duration_since(now);
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Rate limiter delaying request");
            tokio::time::sleep_until(tokio::time::Instant::from_std(admit_at)).await;
        }
        wait
    }

    /// Admissions currently inside the window
    #[must_use]
    pub fn current_rate(&self) -> usize {
        let mut state = self.state.lock();
        state.evict(Instant::now(), self.settings.time_window);
        state.timestamps.len()
    }

    #[must_use]
    pub fn metrics(&self) -> RateLimiterMetrics {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.evict(now, self.settings.time_window);

        let count = state.timestamps.len();
        let requests_per_second = match state.timestamps.front() {
            Some(oldest) => {
                let span = now.saturating_duration_since(*oldest).as_secs_f64();
                if span > 0.0 { count as f64 / span } else { 0.0 }
            }
            None => 0.0,
        };
        let average_delay_secs = if count > 1 {
            let gaps: f64 = state
                .timestamps
                .iter()
                .zip(state.timestamps.iter().skip(1))
                .map(|(a, b)| b.saturating_duration_since(*a).as_secs_f64())
                .sum();
            gaps / (count - 1) as f64
        } else {
            0.0
        };

        RateLimiterMetrics {
            current_rate: count,
            max_requests: self.settings.max_requests,
            time_window_secs: self.settings.time_window.as_secs_f64(),
            requests_per_second,
            average_delay_secs,
            min_delay_secs: self.settings.min_delay.as_secs_f64(),
            max_delay_secs: self.settings.max_delay.as_secs_f64(),
            use_random_delay: self.settings.use_random_delay,
        }
    }

    /// Forget all recorded admissions
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.timestamps.clear();
        state.last_request = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn settings(max_requests: usize, window_ms: u64, delay_ms: u64) -> RateLimitSettings {
        RateLimitSettings {
            max_requests,
            time_window: Duration::from_millis(window_ms),
            min_delay: Duration::from_millis(delay_ms),
            max_delay: Duration::from_millis(delay_ms),
            use_random_delay: false,
        }
    }

    #[test]
    fn test_schedule_immediate_when_window_has_room() {
        let mut state = WindowState::default();
        let t0 = Instant::now();
        let window = Duration::from_secs(60);

        assert_eq!(state.schedule(t0, 3, window, Duration::ZERO), t0);
        assert_eq!(state.schedule(t0, 3, window, Duration::ZERO), t0);
        assert_eq!(state.schedule(t0, 3, window, Duration::ZERO), t0);

        let fourth = state.schedule(t0, 3, window, Duration::ZERO);
        assert!(fourth > t0 + window);
    }

    #[test]
    fn test_schedule_enforces_spacing() {
        let mut state = WindowState::default();
        let t0 = Instant::now();
        let spacing = Duration::from_millis(500);
        let window = Duration::from_secs(60);

        let first = state.schedule(t0, 10, window, spacing);
        let second = state.schedule(t0, 10, window, spacing);
        let third = state.schedule(t0 + Duration::from_secs(5), 10, window, spacing);

        assert_eq!(first, t0);
        assert_eq!(second, t0 + spacing);
        assert_eq!(third, t0 + Duration::from_secs(5));
    }

    #[test]
    fn test_eviction_frees_slots() {
        let mut state = WindowState::default();
        let t0 = Instant::now();
        let window = Duration::from_secs(1);

        state.schedule(t0, 1, window, Duration::ZERO);
        let later = t0 + Duration::from_secs(2);
        assert_eq!(state.schedule(later, 1, window, Duration::ZERO), later);
        assert_eq!(state.timestamps.len(), 1);
    }

    proptest! {
        /// No window of length `time_window` ever holds more than
        /// `max_requests` admissions.
        #[test]
        fn prop_window_never_over_admits(
            max_requests in 1usize..6,
            window_ms in 10u64..2_000,
            spacing_ms in 0u64..50,
            arrivals in proptest::collection::vec(0u64..500, 1..60),
        ) {
            let mut state = WindowState::default();
            let window = Duration::from_millis(window_ms);
            let spacing = Duration::from_millis(spacing_ms);
            let base = Instant::now();

            let mut clock = base;
            let mut admitted = Vec::new();
            for gap in arrivals {
                clock += Duration::from_millis(gap);
                let at = state.schedule(clock, max_requests, window, spacing);
                prop_assert!(at >= clock);
                admitted.push(at);
            }

            for pair in admitted.windows(2) {
                prop_assert!(pair[1] >= pair[0] + spacing);
            }
            for i in max_requests..admitted.len() {
                prop_assert!(admitted[i] - admitted[i - max_requests] > window);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admissions_never_over_admit() {
        let window = Duration::from_millis(300);
        let limiter = Arc::new(RateLimiter::new(settings(2, 300, 0)));
        let start = Instant::now();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.admit().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Third pair can only start after two full windows
        assert!(start.elapsed() >= window * 2);

        let admitted: Vec<Instant> = limiter.state.lock().timestamps.iter().copied().collect();
        assert_eq!(admitted.len(), 6);
        for i in 2..admitted.len() {
            assert!(admitted[i] - admitted[i - 2] > window);
        }
    }

    #[tokio::test]
    async fn test_admit_without_limits_does_not_wait() {
        let limiter = RateLimiter::new(settings(10, 60_000, 0));
        assert_eq!(limiter.admit().await, Duration::ZERO);
        assert_eq!(limiter.admit().await, Duration::ZERO);
        assert_eq!(limiter.current_rate(), 2);
    }

    #[tokio::test]
    async fn test_admit_waits_for_spacing() {
        let limiter = RateLimiter::new(settings(10, 60_000, 100));
        let start = std::time::Instant::now();
        limiter.admit().await;
        let waited = limiter.admit().await;
        assert!(waited > Duration::from_millis(50));
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn test_metrics_and_reset() {
        let limiter = RateLimiter::new(settings(5, 60_000, 0));
        limiter.admit().await;
        limiter.admit().await;

        let metrics = limiter.metrics();
        assert_eq!(metrics.current_rate, 2);
        assert_eq!(metrics.max_requests, 5);
        assert!((metrics.time_window_secs - 60.0).abs() < f64::EPSILON);

        limiter.reset();
        assert_eq!(limiter.current_rate(), 0);
        assert_eq!(limiter.metrics().requests_per_second, 0.0);
    }
}

//! Soft-ban cooldown handling
//!
//! A 403 or 429 from the portal means "slow down". The fetcher resets its
//! session, then waits out the cooldown in short chunks so a cancellation is
//! noticed within one chunk.

use std::time::Duration;
use tracing::debug;

use super::cancellation::{CancellationSignal, ensure_active};
use crate::error::LookupResult;
use crate::utils::{DEFAULT_COOLDOWN_SECS, FORBIDDEN_COOLDOWN_FLOOR_SECS};

/// Per-attempt soft-ban state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Active,
    SoftBanned { wait: Duration, status: u16 },
}

impl CooldownState {
    /// Classify a response by status and its `Retry-After` header value
    #[must_use]
    pub fn from_response(status: u16, retry_after: Option<&str>) -> Self {
        if is_soft_ban(status) {
            CooldownState::SoftBanned {
                wait: cooldown_for(status, retry_after),
                status,
            }
        } else {
            CooldownState::Active
        }
    }
}

#[must_use]
pub fn is_soft_ban(status: u16) -> bool {
    status == 403 || status == 429
}

/// Cooldown length for a soft-ban response.
///
/// Uses the `Retry-After` seconds when they parse as an integer, otherwise
/// `DEFAULT_COOLDOWN_SECS`. A 403 never waits less than
/// `FORBIDDEN_COOLDOWN_FLOOR_SECS`.
#[must_use]
pub fn cooldown_for(status: u16, retry_after: Option<&str>) -> Duration {
    let secs = retry_after
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_COOLDOWN_SECS);
    let secs = if status == 403 {
        secs.max(FORBIDDEN_COOLDOWN_FLOOR_SECS)
    } else {
        secs
    };
    Duration::from_secs(secs)
}

/// Sleep for `total`, checking `cancel` before every chunk.
///
/// # Errors
///
/// Returns `LookupError::Cancelled` as soon as the signal is observed.
pub async fn sleep_cancellable(
    total: Duration,
    chunk: Duration,
    cancel: &dyn CancellationSignal,
) -> LookupResult<()> {
    let chunk = if chunk.is_zero() { total } else { chunk };
    let mut remaining = total;
    while !remaining.is_zero() {
        ensure_active(cancel)?;
        let step = remaining.min(chunk);
        debug!(
            step_ms = step.as_millis() as u64,
            remaining_ms = remaining.as_millis() as u64,
            "Cooling down"
        );
        tokio::time::sleep(step).await;
        remaining -= step;
    }
    ensure_active(cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch_engine::NeverCancel;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_cooldown_for() {
        assert_eq!(cooldown_for(429, Some("12")), Duration::from_secs(12));
        assert_eq!(cooldown_for(429, None), Duration::from_secs(30));
        assert_eq!(
            cooldown_for(429, Some("Wed, 21 Oct 2015 07:28:00 GMT")),
            Duration::from_secs(30)
        );
        assert_eq!(cooldown_for(403, Some("5")), Duration::from_secs(60));
        assert_eq!(cooldown_for(403, Some("120")), Duration::from_secs(120));
    }

    #[test]
    fn test_state_from_response() {
        assert_eq!(CooldownState::from_response(200, None), CooldownState::Active);
        assert_eq!(CooldownState::from_response(500, Some("9")), CooldownState::Active);
        assert_eq!(
            CooldownState::from_response(429, Some("9")),
            CooldownState::SoftBanned {
                wait: Duration::from_secs(9),
                status: 429
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_cancellable_completes() {
        let start = tokio::time::Instant::now();
        sleep_cancellable(Duration::from_secs(12), Duration::from_secs(5), &NeverCancel)
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test]
    async fn test_sleep_cancellable_stops_when_signalled() {
        let fired = AtomicBool::new(true);
        let result =
            sleep_cancellable(Duration::from_secs(60), Duration::from_secs(5), &fired).await;
        assert!(matches!(result, Err(crate::error::LookupError::Cancelled)));
    }
}

//! Rate-governed HTTP fetching for the registry portal
//!
//! The `Fetcher` gates every request through the sliding-window
//! `RateLimiter`, inspects successful pages with the block detector and
//! handles soft bans (403/429) with a chunked, cancellable cooldown.

pub mod block_detector;
pub mod cancellation;
pub mod cooldown;
pub mod fetcher;
pub mod rate_limiter;

pub use block_detector::is_blocked;
pub use cancellation::{CancellationSignal, NeverCancel};
pub use cooldown::CooldownState;
pub use fetcher::{FetchedPage, Fetcher};
pub use rate_limiter::{RateLimitSettings, RateLimiter, RateLimiterMetrics};

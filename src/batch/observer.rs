//! Observer hooks for batch runs
//!
//! Every method has an empty default so callers implement only the events
//! they care about.

use super::BatchRow;
use crate::error::LookupError;

/// Receives batch lifecycle events as they happen
pub trait BatchObserver: Send + Sync {
    /// A query is about to be looked up. `ordinal` is 1-based.
    fn on_progress(&self, _ordinal: usize, _total: usize, _query: &str) {}

    /// A row was produced, successful or not
    fn on_result(&self, _row: &BatchRow) {}

    /// A query failed with a recoverable error; the run continues
    fn on_error(&self, _query: &str, _error: &LookupError) {}

    /// The portal asked for manual verification; the run stops after this
    fn on_verification_required(&self, _ordinal: usize, _total: usize, _message: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl BatchObserver for NoOpObserver {}

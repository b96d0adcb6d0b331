//! Cooperative cancellation
//!
//! Long-running operations poll a `CancellationSignal` at their suspension
//! points and stop with `LookupError::Cancelled` once it reports true.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{LookupError, LookupResult};

/// Predicate polled by fetches and batch runs
pub trait CancellationSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// Signal that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationSignal for NeverCancel {
    #[inline(always)]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<F> CancellationSignal for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// `Err(Cancelled)` once the signal has fired
pub(crate) fn ensure_active(cancel: &dyn CancellationSignal) -> LookupResult<()> {
    if cancel.is_cancelled() {
        Err(LookupError::Cancelled)
    } else {
        Ok(())
    }
}

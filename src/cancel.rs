//! Cooperative cancellation shared by every suspension point of a request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ContextError;

/// A cloneable cancellation flag.
///
/// Clones share the same flag: cancelling any of them is observed by all.
/// The signal is only checked between I/O steps; an in-flight read or
/// process call runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    /// Creates a signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns [`ContextError::Cancelled`] once the signal has fired.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            Err(ContextError::Cancelled)
        } else {
            Ok(())
        }
    }
}

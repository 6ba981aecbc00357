//! Progress reporting for the context pipeline.
//!
//! The pipeline only ever calls [`ProgressReporter::report`]; nothing it
//! does depends on what a reporter does with the call.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

/// Receives coarse progress steps.
pub trait ProgressReporter: Send + Sync {
    /// Announces `step`; `weight` is the share of total work it represents.
    fn report(&self, _step: &str, _weight: u32) {}
}

/// Reporter that ignores every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {}

/// Reporter that logs each step through `tracing`, keeping a running
/// total of reported weight.
#[derive(Debug, Default)]
pub struct TracingProgress {
    completed: AtomicU32,
}

impl TracingProgress {
    /// Creates a reporter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of weights reported so far.
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for TracingProgress {
    fn report(&self, step: &str, weight: u32) {
        let before = self
            .completed
            .fetch_add(weight, Ordering::Relaxed);
        info!(step, weight, completed = before + weight, "Progress");
    }
}

//! Distinguished outcomes of a context-gathering request.

use std::path::PathBuf;

use thiserror::Error;

/// Structural failures that callers are expected to match on.
///
/// Item-level problems (an unreadable untracked file, a failed
/// `git ls-files` call) never surface here; they are logged and skipped.
#[derive(Error, Debug)]
pub enum ContextError {
    /// The requested change sections were all empty.
    #[error("No changes detected")]
    NoChanges,

    /// No repository could be found for the requested location.
    #[error("No Git repositories found")]
    NoRepository,

    /// Several repositories matched and none could be preferred.
    #[error("No repository selected: {} candidates matched", .0.len())]
    AmbiguousRepository(Vec<PathBuf>),

    /// The shared cancellation signal fired before the request finished.
    #[error("Operation cancelled")]
    Cancelled,

    /// A version-control query (status, diff, log) failed.
    #[error("Version control query failed: {0}")]
    Vcs(#[source] anyhow::Error),
}

impl ContextError {
    /// Returns true for the outcomes a caller should report quietly
    /// rather than as a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoChanges | Self::Cancelled)
    }
}

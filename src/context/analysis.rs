//! History context for the files in a change set.

use tracing::warn;

use crate::cancel::CancellationSignal;
use crate::error::ContextError;
use crate::git::change_set::{ChangeSection, ChangeSet};
use crate::git::history::{HistoryAggregator, HistoryLimits};
use crate::git::provider::RepositoryProvider;

/// Returned when the change set names no files.
pub const NO_FILES: &str = "No files to analyze";

/// Returned when the history query fails.
pub const HISTORY_UNAVAILABLE: &str = "History analysis not available";

/// Describes which files changed and, for files with history, the recent
/// commits touching them.
///
/// Untracked files are listed separately and never queried, since they
/// have no commits. Any failure other than cancellation degrades to
/// [`HISTORY_UNAVAILABLE`].
pub async fn build_history_context(
    provider: &dyn RepositoryProvider,
    cancel: &CancellationSignal,
    change_set: &ChangeSet,
    limits: HistoryLimits,
) -> Result<String, ContextError> {
    let tracked = unique_paths([&change_set.staged, &change_set.tracked]);
    let untracked = unique_paths([&change_set.untracked]);

    if tracked.is_empty() && untracked.is_empty() {
        return Ok(NO_FILES.to_string());
    }

    let mut lines: Vec<String> = Vec::new();
    if !tracked.is_empty() {
        lines.push("Changed files (tracked):".to_string());
        lines.extend(tracked.iter().map(|p| format!("- {p}")));
    }
    if !untracked.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Untracked new files:".to_string());
        lines.extend(untracked.iter().map(|p| format!("- {p}")));
    }

    if !tracked.is_empty() {
        let history = match HistoryAggregator::new(provider, cancel)
            .with_limits(limits)
            .recent_commits_for_files(tracked.as_slice())
            .await
        {
            Ok(history) => history,
            Err(ContextError::Cancelled) => return Err(ContextError::Cancelled),
            Err(e) => {
                warn!(error = %e, "History analysis failed");
                return Ok(HISTORY_UNAVAILABLE.to_string());
            }
        };
        lines.push(String::new());
        lines.push("Recent commits (HEAD, tracked files only):".to_string());
        lines.push(history);
    }

    Ok(lines.join("\n").trim().to_string())
}

/// Trimmed, non-empty, non-escaping paths across `sections`, first
/// occurrence order.
fn unique_paths<const N: usize>(sections: [&ChangeSection; N]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for path in sections.iter().flat_map(|s| s.paths()) {
        let path = path.trim();
        if path.is_empty() || path.starts_with("..") {
            continue;
        }
        if !out.iter().any(|p| p == path) {
            out.push(path.to_string());
        }
    }
    out
}

//! Recent-commit summaries for a set of changed files.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::cancel::CancellationSignal;
use crate::error::ContextError;
use crate::git::provider::{CommitEntry, RepositoryProvider};
use crate::git::SHORT_HASH_LEN;

/// Default number of distinct files queried.
pub const DEFAULT_MAX_HISTORY_FILES: usize = 10;

/// Default number of commits fetched per file.
pub const DEFAULT_COMMITS_PER_FILE: usize = 3;

/// Attributed paths shown per commit line before collapsing to `(+N more)`.
const MAX_SHOWN_PATHS: usize = 3;

/// Caps applied by [`HistoryAggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Distinct files queried; the rest are only counted.
    pub max_files: usize,
    /// Commits fetched per queried file.
    pub commits_per_file: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_HISTORY_FILES,
            commits_per_file: DEFAULT_COMMITS_PER_FILE,
        }
    }
}

impl HistoryLimits {
    /// Most commits a summary displays.
    pub fn max_commits(&self) -> usize {
        self.max_files.saturating_mul(self.commits_per_file)
    }
}

/// One distinct commit across an aggregation, with the queried paths it
/// was found under (first-seen order, no repeats).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Author timestamp, when known.
    pub author_date: Option<DateTime<Utc>>,
    /// Author name, when known.
    pub author_name: Option<String>,
    /// Summary line, when known.
    pub message: Option<String>,
    /// Queried paths whose log contained this commit.
    pub attributed_paths: Vec<String>,
}

impl CommitRecord {
    fn from_entry(entry: CommitEntry, path: &str) -> Self {
        Self {
            hash: entry.hash,
            author_date: entry.author_date,
            author_name: entry.author_name,
            message: entry.message,
            attributed_paths: vec![path.to_string()],
        }
    }

    fn attribute(&mut self, path: &str) {
        if !self.attributed_paths.iter().any(|p| p == path) {
            self.attributed_paths.push(path.to_string());
        }
    }

    /// Milliseconds since the epoch; unknown dates sort as the epoch.
    fn sort_key(&self) -> i64 {
        self.author_date.map_or(0, |date| date.timestamp_millis())
    }

    fn short_hash(&self) -> String {
        self.hash.chars().take(SHORT_HASH_LEN).collect()
    }

    fn render_line(&self) -> String {
        let date = self
            .author_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let author = self.author_name.as_deref().unwrap_or("");
        let message = self.message.as_deref().unwrap_or("");

        let shown = self
            .attributed_paths
            .iter()
            .take(MAX_SHOWN_PATHS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let paths = if self.attributed_paths.len() > MAX_SHOWN_PATHS {
            format!("{shown} (+{} more)", self.attributed_paths.len() - MAX_SHOWN_PATHS)
        } else {
            shown
        };

        format!(
            "{} {date} {author} | {message} [paths: {paths}]",
            self.short_hash()
        )
        .trim()
        .to_string()
    }
}

/// Result of one aggregation: the files queried and the commits to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    /// Files that were queried, in request order.
    pub selected_files: Vec<String>,
    /// Distinct files beyond the file cap.
    pub omitted_files: usize,
    /// Displayed commits, newest first.
    pub commits: Vec<CommitRecord>,
    /// Distinct commits beyond the display cap.
    pub omitted_commits: usize,
}

impl fmt::Display for HistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selected files:")?;
        for file in &self.selected_files {
            writeln!(f, "- {file}")?;
        }
        if self.omitted_files > 0 {
            writeln!(f, "(and {} more files...)", self.omitted_files)?;
        }
        writeln!(f)?;

        if self.commits.is_empty() {
            return write!(f, "Recent commits: (no history found)");
        }

        write!(f, "Recent commits (touching selected files):")?;
        for commit in &self.commits {
            write!(f, "\n{}", commit.render_line())?;
        }
        if self.omitted_commits > 0 {
            write!(f, "\n(and {} more commits...)", self.omitted_commits)?;
        }
        Ok(())
    }
}

/// Fetches per-file history and merges it into one ranked list.
pub struct HistoryAggregator<'a> {
    provider: &'a dyn RepositoryProvider,
    cancel: &'a CancellationSignal,
    limits: HistoryLimits,
}

impl<'a> HistoryAggregator<'a> {
    /// Creates an aggregator with default limits.
    pub fn new(provider: &'a dyn RepositoryProvider, cancel: &'a CancellationSignal) -> Self {
        Self {
            provider,
            cancel,
            limits: HistoryLimits::default(),
        }
    }

    /// Overrides the file and per-file commit caps.
    pub fn with_limits(mut self, limits: HistoryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Queries history for `files` and merges commits by hash.
    ///
    /// Paths are trimmed, blanks dropped and repeats removed before the
    /// file cap applies. Commits are ordered newest first; ties keep the
    /// order in which they were first seen.
    pub async fn aggregate<S: AsRef<str>>(
        &self,
        files: &[S],
    ) -> Result<HistorySummary, ContextError> {
        self.cancel.check()?;

        let mut unique_files: Vec<&str> = Vec::new();
        for file in files.iter().map(|f| f.as_ref().trim()) {
            if !file.is_empty() && !unique_files.contains(&file) {
                unique_files.push(file);
            }
        }
        let selected_count = unique_files.len().min(self.limits.max_files);
        let selected = &unique_files[..selected_count];

        let mut commits: Vec<CommitRecord> = Vec::new();
        for file in selected {
            self.cancel.check()?;
            let entries = self
                .provider
                .log(file, self.limits.commits_per_file)
                .await
                .map_err(ContextError::Vcs)?;
            debug!(path = %file, count = entries.len(), "Fetched file history");

            for entry in entries {
                match commits.iter_mut().find(|c| c.hash == entry.hash) {
                    Some(existing) => existing.attribute(file),
                    None => commits.push(CommitRecord::from_entry(entry, file)),
                }
            }
        }

        commits.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

        let max_commits = self.limits.max_commits();
        let omitted_commits = commits.len().saturating_sub(max_commits);
        commits.truncate(max_commits);

        Ok(HistorySummary {
            selected_files: selected.iter().map(|f| (*f).to_string()).collect(),
            omitted_files: unique_files.len() - selected_count,
            commits,
            omitted_commits,
        })
    }

    /// Aggregates and renders in one step.
    pub async fn recent_commits_for_files<S: AsRef<str>>(
        &self,
        files: &[S],
    ) -> Result<String, ContextError> {
        Ok(self.aggregate(files).await?.to_string())
    }
}

//! Narrow capabilities the assembler and history aggregator depend on.
//!
//! Each trait returns boxed futures so implementations can be swapped for
//! in-memory fakes in tests. The concrete adapters live in
//! [`repository`](super::repository) (libgit2) and
//! [`process`](super::process) (the `git` binary and the filesystem).

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

/// Working-tree status of one path as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// Content differs from the index.
    Modified,
    /// Removed from the working tree.
    Deleted,
    /// Renamed in the working tree.
    Renamed,
    /// File type changed (e.g. file to symlink).
    TypeChanged,
    /// Not known to the index at all.
    Untracked,
    /// Recorded with `git add -N`: present in the index without content.
    IntentToAdd,
    /// Merge conflict.
    Conflicted,
}

impl ChangeStatus {
    /// Whether this status describes a file with no committed content.
    pub fn is_new(self) -> bool {
        matches!(self, Self::Untracked | Self::IntentToAdd)
    }
}

/// One entry of the provider's working-tree change list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingTreeChange {
    /// Absolute path of the changed file.
    pub path: PathBuf,
    /// Status classification.
    pub status: ChangeStatus,
}

/// One commit as returned by a path-filtered log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// Full commit hash.
    pub hash: String,
    /// Author name, when recorded.
    pub author_name: Option<String>,
    /// Author timestamp, when recorded.
    pub author_date: Option<DateTime<Utc>>,
    /// Commit summary line, when present.
    pub message: Option<String>,
}

/// Version-control queries against one repository.
pub trait RepositoryProvider: Send + Sync {
    /// Root of the working tree.
    fn root(&self) -> &Path;

    /// Brings cached status information up to date.
    fn refresh_status(&self) -> BoxFuture<'_, Result<()>>;

    /// Unified diff of the index against HEAD (`staged`) or of the working
    /// tree against the index (`!staged`).
    fn diff(&self, staged: bool) -> BoxFuture<'_, Result<String>>;

    /// Absolute paths the provider reports as untracked.
    fn untracked_changes(&self) -> BoxFuture<'_, Result<Vec<PathBuf>>>;

    /// Every working-tree change with its status.
    fn working_tree_changes(&self) -> BoxFuture<'_, Result<Vec<WorkingTreeChange>>>;

    /// Most recent commits touching `path`, newest first, at most
    /// `max_entries` of them.
    fn log<'a>(
        &'a self,
        path: &'a str,
        max_entries: usize,
    ) -> BoxFuture<'a, Result<Vec<CommitEntry>>>;
}

/// Raw file reads.
pub trait FileReader: Send + Sync {
    /// Reads the whole file at `path`.
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<u8>>>;
}

/// Runs the version-control binary with a fixed argument list.
pub trait ProcessRunner: Send + Sync {
    /// Executes with `args` in `working_dir` and returns stdout.
    fn execute<'a>(
        &'a self,
        args: &'a [&'a str],
        working_dir: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<u8>>>;
}

//! Shared test doubles for the `git` capability traits.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;

use crate::cancel::CancellationSignal;
use crate::git::provider::{
    ChangeStatus, CommitEntry, FileReader, ProcessRunner, RepositoryProvider, WorkingTreeChange,
};

/// Shared log of the calls a mock received, in order.
pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

/// In-memory repository with canned diffs, status lists and per-path logs.
///
/// Every call is appended to [`calls`](Self::calls) as a short tag
/// (`"refresh"`, `"diff:staged"`, `"log:src/a.rs"`...). A cancellation
/// trigger can be armed so the signal fires the first time a given tag is
/// recorded, which lets tests interrupt assembly at a precise step.
pub(crate) struct MockRepository {
    root: PathBuf,
    staged_diff: String,
    unstaged_diff: String,
    untracked: Vec<PathBuf>,
    working_tree: Vec<WorkingTreeChange>,
    logs: HashMap<String, Vec<CommitEntry>>,
    failing_logs: bool,
    failing_untracked: bool,
    cancel_on: Option<(String, CancellationSignal)>,
    calls: CallLog,
}

impl MockRepository {
    /// Creates an empty repository rooted at `root`.
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged_diff: String::new(),
            unstaged_diff: String::new(),
            untracked: Vec::new(),
            working_tree: Vec::new(),
            logs: HashMap::new(),
            failing_logs: false,
            failing_untracked: false,
            cancel_on: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_staged_diff(mut self, diff: &str) -> Self {
        self.staged_diff = diff.to_string();
        self
    }

    pub(crate) fn with_unstaged_diff(mut self, diff: &str) -> Self {
        self.unstaged_diff = diff.to_string();
        self
    }

    /// Adds provider-reported untracked files (repo-relative, joined to root).
    pub(crate) fn with_untracked(mut self, paths: &[&str]) -> Self {
        let root = self.root.clone();
        self.untracked.extend(paths.iter().map(|p| root.join(p)));
        self
    }

    /// Adds a working-tree status entry (repo-relative, joined to root).
    pub(crate) fn with_working_tree_change(mut self, path: &str, status: ChangeStatus) -> Self {
        self.working_tree.push(WorkingTreeChange {
            path: self.root.join(path),
            status,
        });
        self
    }

    /// Registers the log returned for `path`.
    pub(crate) fn with_log(mut self, path: &str, entries: Vec<CommitEntry>) -> Self {
        self.logs.insert(path.to_string(), entries);
        self
    }

    /// Makes every `log` call fail.
    pub(crate) fn with_failing_logs(mut self) -> Self {
        self.failing_logs = true;
        self
    }

    /// Makes `untracked_changes` fail.
    pub(crate) fn with_failing_untracked(mut self) -> Self {
        self.failing_untracked = true;
        self
    }

    /// Fires `signal` when a call tagged `tag` is recorded.
    pub(crate) fn cancel_on(mut self, tag: &str, signal: CancellationSignal) -> Self {
        self.cancel_on = Some((tag.to_string(), signal));
        self
    }

    /// Handle on the call log, usable after the mock has been moved.
    pub(crate) fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    fn record(&self, tag: String) {
        if let Some((trigger, signal)) = &self.cancel_on {
            if *trigger == tag {
                signal.cancel();
            }
        }
        self.calls.lock().unwrap().push(tag);
    }
}

impl RepositoryProvider for MockRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn refresh_status(&self) -> BoxFuture<'_, Result<()>> {
        self.record("refresh".to_string());
        Box::pin(async { Ok(()) })
    }

    fn diff(&self, staged: bool) -> BoxFuture<'_, Result<String>> {
        let (tag, diff) = if staged {
            ("diff:staged", self.staged_diff.clone())
        } else {
            ("diff:unstaged", self.unstaged_diff.clone())
        };
        self.record(tag.to_string());
        Box::pin(async move { Ok(diff) })
    }

    fn untracked_changes(&self) -> BoxFuture<'_, Result<Vec<PathBuf>>> {
        self.record("untracked".to_string());
        let result = if self.failing_untracked {
            Err(anyhow!("status unavailable"))
        } else {
            Ok(self.untracked.clone())
        };
        Box::pin(async move { result })
    }

    fn working_tree_changes(&self) -> BoxFuture<'_, Result<Vec<WorkingTreeChange>>> {
        self.record("working_tree".to_string());
        let changes = self.working_tree.clone();
        Box::pin(async move { Ok(changes) })
    }

    fn log<'a>(
        &'a self,
        path: &'a str,
        max_entries: usize,
    ) -> BoxFuture<'a, Result<Vec<CommitEntry>>> {
        self.record(format!("log:{path}"));
        let result = if self.failing_logs {
            Err(anyhow!("log failed for {path}"))
        } else {
            let mut entries = self.logs.get(path).cloned().unwrap_or_default();
            entries.truncate(max_entries);
            Ok(entries)
        };
        Box::pin(async move { result })
    }
}

/// File reader over an in-memory map; unknown paths fail with `NotFound`.
pub(crate) struct MockFileReader {
    files: HashMap<PathBuf, Vec<u8>>,
    cancel_on_read: Option<CancellationSignal>,
    reads: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileReader {
    pub(crate) fn new() -> Self {
        Self {
            files: HashMap::new(),
            cancel_on_read: None,
            reads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_file(mut self, path: impl Into<PathBuf>, content: &[u8]) -> Self {
        self.files.insert(path.into(), content.to_vec());
        self
    }

    /// Fires `signal` on every read; the read itself still succeeds.
    pub(crate) fn cancel_on_read(mut self, signal: CancellationSignal) -> Self {
        self.cancel_on_read = Some(signal);
        self
    }

    /// Handle on the paths read so far.
    pub(crate) fn reads(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        self.reads.clone()
    }
}

impl FileReader for MockFileReader {
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<u8>>> {
        self.reads.lock().unwrap().push(path.to_path_buf());
        if let Some(signal) = &self.cancel_on_read {
            signal.cancel();
        }
        let result = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()));
        Box::pin(async move { result })
    }
}

/// Process runner returning canned stdout (or a failure) and recording
/// every invocation's arguments.
pub(crate) struct MockProcessRunner {
    stdout: Option<Vec<u8>>,
    invocations: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockProcessRunner {
    pub(crate) fn returning(stdout: &[u8]) -> Self {
        Self {
            stdout: Some(stdout.to_vec()),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            stdout: None,
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the recorded argument lists.
    pub(crate) fn invocations(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        self.invocations.clone()
    }
}

impl ProcessRunner for MockProcessRunner {
    fn execute<'a>(
        &'a self,
        args: &'a [&'a str],
        _working_dir: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.invocations
            .lock()
            .unwrap()
            .push(args.iter().map(|a| (*a).to_string()).collect());
        let result = self
            .stdout
            .clone()
            .ok_or_else(|| anyhow!("git: command not found"));
        Box::pin(async move { result })
    }
}

/// Builds a log entry; `date` is `YYYY-MM-DD`.
pub(crate) fn commit(hash: &str, date: Option<&str>, author: &str, message: &str) -> CommitEntry {
    CommitEntry {
        hash: hash.to_string(),
        author_name: Some(author.to_string()),
        author_date: date.map(|d| {
            chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc()
        }),
        message: Some(message.to_string()),
    }
}

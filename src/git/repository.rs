//! Git repository operations backed by libgit2.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use git2::{
    Commit, Diff, DiffFormat, DiffOptions, ErrorCode, Index, Repository, Sort, Status,
    StatusOptions, Tree,
};
use tracing::debug;

use crate::error::ContextError;
use crate::git::provider::{ChangeStatus, CommitEntry, RepositoryProvider, WorkingTreeChange};

/// Git repository wrapper.
///
/// Only the working-tree root is held; every query reopens the repository
/// on a blocking worker thread, so the wrapper is `Send + Sync` and never
/// blocks the async runtime.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Opens the repository containing `path`.
    ///
    /// Bare repositories are rejected since they have no working tree.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, ContextError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "No repository found");
            ContextError::NoRepository
        })?;
        let root = repo.workdir().ok_or(ContextError::NoRepository)?.to_path_buf();
        Ok(Self { root })
    }

    /// Root of the working tree.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Runs `f` against a freshly opened repository on a blocking thread.
    async fn with_repo<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&root)
                .with_context(|| format!("Failed to open git repository at {}", root.display()))?;
            f(&repo)
        })
        .await
        .context("Git worker task failed")?
    }
}

impl RepositoryProvider for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    // Every query reopens the repository, so this only proves the index is
    // readable before assembly starts.
    fn refresh_status(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.with_repo(|repo| {
            let mut index = repo.index().context("Failed to open index")?;
            index.read(true).context("Failed to reload index")?;
            Ok(())
        }))
    }

    fn diff(&self, staged: bool) -> BoxFuture<'_, Result<String>> {
        Box::pin(self.with_repo(move |repo| {
            let mut opts = DiffOptions::new();
            let diff = if staged {
                let head = head_tree(repo)?;
                repo.diff_tree_to_index(head.as_ref(), None, Some(&mut opts))
                    .context("Failed to diff index against HEAD")?
            } else {
                repo.diff_index_to_workdir(None, Some(&mut opts))
                    .context("Failed to diff working tree against index")?
            };
            render_patch(&diff)
        }))
    }

    fn untracked_changes(&self) -> BoxFuture<'_, Result<Vec<PathBuf>>> {
        let root = self.root.clone();
        Box::pin(self.with_repo(move |repo| {
            let changes = collect_statuses(repo, &root)?;
            Ok(changes
                .into_iter()
                .filter(|c| c.status == ChangeStatus::Untracked)
                .map(|c| c.path)
                .collect())
        }))
    }

    fn working_tree_changes(&self) -> BoxFuture<'_, Result<Vec<WorkingTreeChange>>> {
        let root = self.root.clone();
        Box::pin(self.with_repo(move |repo| collect_statuses(repo, &root)))
    }

    fn log<'a>(
        &'a self,
        path: &'a str,
        max_entries: usize,
    ) -> BoxFuture<'a, Result<Vec<CommitEntry>>> {
        let path = path.to_string();
        Box::pin(self.with_repo(move |repo| commits_touching(repo, &path, max_entries)))
    }
}

/// Returns the HEAD tree, or `None` on an unborn branch.
fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree().context("Failed to peel HEAD to tree")?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e).context("Failed to get HEAD reference"),
    }
}

/// Renders a diff in patch format, mirroring `git diff` output.
fn render_patch(diff: &Diff<'_>) -> Result<String> {
    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let prefix = match line.origin() {
            '+' => "+",
            '-' => "-",
            ' ' => " ",
            _ => "",
        };
        out.push_str(prefix);
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .context("Failed to format diff")?;
    Ok(out)
}

fn collect_statuses(repo: &Repository, root: &Path) -> Result<Vec<WorkingTreeChange>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let statuses = repo
        .statuses(Some(&mut opts))
        .context("Failed to get repository status")?;

    let index = repo.index().context("Failed to open index")?;

    let mut changes = Vec::new();
    for entry in statuses.iter() {
        let relative = String::from_utf8_lossy(entry.path_bytes()).into_owned();
        let intent_to_add = is_intent_to_add(&index, &relative);
        let Some(status) = classify_worktree_status(entry.status(), intent_to_add) else {
            continue;
        };
        changes.push(WorkingTreeChange {
            path: root.join(relative),
            status,
        });
    }

    debug!(count = changes.len(), "Collected working tree changes");
    Ok(changes)
}

/// `GIT_INDEX_ENTRY_INTENT_TO_ADD` in an index entry's extended flags.
const INDEX_ENTRY_INTENT_TO_ADD: u16 = 1 << 13;

/// Whether `path` sits in the index as a `git add -N` placeholder.
fn is_intent_to_add(index: &Index, path: &str) -> bool {
    index
        .get_path(Path::new(path), 0)
        .is_some_and(|entry| entry.flags_extended & INDEX_ENTRY_INTENT_TO_ADD != 0)
}

/// Maps libgit2 status flags to a working-tree status; index-only changes
/// yield `None`. libgit2 reports intent-to-add entries as new in the index
/// and modified in the worktree, so the index flag takes precedence.
fn classify_worktree_status(flags: Status, intent_to_add: bool) -> Option<ChangeStatus> {
    if flags.contains(Status::CONFLICTED) {
        Some(ChangeStatus::Conflicted)
    } else if intent_to_add {
        Some(ChangeStatus::IntentToAdd)
    } else if flags.contains(Status::WT_NEW) {
        Some(ChangeStatus::Untracked)
    } else if flags.contains(Status::WT_MODIFIED) {
        Some(ChangeStatus::Modified)
    } else if flags.contains(Status::WT_DELETED) {
        Some(ChangeStatus::Deleted)
    } else if flags.contains(Status::WT_RENAMED) {
        Some(ChangeStatus::Renamed)
    } else if flags.contains(Status::WT_TYPECHANGE) {
        Some(ChangeStatus::TypeChanged)
    } else {
        None
    }
}

/// Walks history from HEAD (newest first) collecting commits whose tree
/// entry for `path` differs from their first parent's.
fn commits_touching(repo: &Repository, path: &str, max_entries: usize) -> Result<Vec<CommitEntry>> {
    if max_entries == 0 {
        return Ok(Vec::new());
    }

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).context("Failed to get HEAD reference"),
    };
    let head_commit = head.peel_to_commit().context("Failed to peel HEAD to commit")?;

    let mut walker = repo.revwalk().context("Failed to create revwalk")?;
    walker
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
        .context("Failed to set revwalk sorting")?;
    walker
        .push(head_commit.id())
        .context("Failed to push HEAD commit")?;

    let target = Path::new(path);
    let mut entries = Vec::new();
    for oid in walker {
        let oid = oid.context("Failed to get commit OID from walker")?;
        let commit = repo.find_commit(oid).context("Failed to find commit")?;
        if touches_path(&commit, target)? {
            entries.push(commit_entry(&commit));
            if entries.len() >= max_entries {
                break;
            }
        }
    }

    debug!(path, count = entries.len(), "Collected commits for path");
    Ok(entries)
}

fn touches_path(commit: &Commit<'_>, path: &Path) -> Result<bool> {
    let tree = commit.tree().context("Failed to get commit tree")?;
    let current = tree.get_path(path).ok().map(|entry| entry.id());

    if commit.parent_count() == 0 {
        return Ok(current.is_some());
    }

    let parent_tree = commit
        .parent(0)
        .context("Failed to get parent commit")?
        .tree()
        .context("Failed to get parent tree")?;
    let previous = parent_tree.get_path(path).ok().map(|entry| entry.id());

    Ok(current != previous)
}

fn commit_entry(commit: &Commit<'_>) -> CommitEntry {
    let author = commit.author();
    CommitEntry {
        hash: commit.id().to_string(),
        author_name: author.name().map(str::to_string),
        author_date: DateTime::<Utc>::from_timestamp(author.when().seconds(), 0),
        message: commit.summary().map(str::to_string),
    }
}

/// Picks the repository a request applies to.
///
/// A single candidate is used as is. With several, the deepest candidate
/// root that contains `hint` wins, so nested repositories resolve to the
/// innermost one.
pub fn select_repository(
    candidates: &[PathBuf],
    hint: Option<&Path>,
) -> Result<PathBuf, ContextError> {
    match candidates {
        [] => Err(ContextError::NoRepository),
        [only] => Ok(only.clone()),
        _ => hint
            .and_then(|hint| {
                candidates
                    .iter()
                    .filter(|root| hint.starts_with(root))
                    .max_by_key(|root| root.components().count())
            })
            .cloned()
            .ok_or_else(|| ContextError::AmbiguousRepository(candidates.to_vec())),
    }
}

//! Builds a [`ChangeSet`] from one repository snapshot.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::cancel::CancellationSignal;
use crate::error::ContextError;
use crate::git::change_set::{ChangeScope, ChangeSection, ChangeSet};
use crate::git::diff_split::{split_by_file, SplitLimits, DEFAULT_MAX_CHARS_PER_FILE};
use crate::git::path_token::UNKNOWN_FILE;
use crate::git::process::{parse_nul_delimited, LIST_UNTRACKED_ARGS};
use crate::git::provider::{FileReader, ProcessRunner, RepositoryProvider};
use crate::git::synthetic::build_added_file_record;

/// Gathers staged, tracked and untracked changes under one cancellation
/// signal.
///
/// The signal is checked before the status refresh, around each diff
/// fetch, before untracked discovery, before every file read and before
/// the `git` fallback. Cancellation discards everything gathered so far.
pub struct ChangeSetAssembler<'a> {
    provider: &'a dyn RepositoryProvider,
    reader: &'a dyn FileReader,
    runner: &'a dyn ProcessRunner,
    cancel: &'a CancellationSignal,
    max_chars_per_file: usize,
}

impl<'a> ChangeSetAssembler<'a> {
    /// Creates an assembler with the default per-file excerpt cap.
    pub fn new(
        provider: &'a dyn RepositoryProvider,
        reader: &'a dyn FileReader,
        runner: &'a dyn ProcessRunner,
        cancel: &'a CancellationSignal,
    ) -> Self {
        Self {
            provider,
            reader,
            runner,
            cancel,
            max_chars_per_file: DEFAULT_MAX_CHARS_PER_FILE,
        }
    }

    /// Overrides the per-file excerpt cap.
    pub fn with_max_chars_per_file(mut self, max_chars: usize) -> Self {
        self.max_chars_per_file = max_chars;
        self
    }

    /// Assembles the sections `scope` asks for.
    ///
    /// `StagedOnly` fails with [`ContextError::NoChanges`] when nothing is
    /// staged and never touches the working tree. `Full` fails only when
    /// all three sections are empty. `WorkingTree` runs the full assembly
    /// (including the emptiness check) and then drops the staged section.
    pub async fn assemble(&self, scope: ChangeScope) -> Result<ChangeSet, ContextError> {
        self.cancel.check()?;
        self.provider
            .refresh_status()
            .await
            .map_err(ContextError::Vcs)?;

        let staged = self.diff_section(true).await?;

        if scope == ChangeScope::StagedOnly {
            if staged.is_empty() {
                return Err(ContextError::NoChanges);
            }
            return Ok(ChangeSet {
                staged,
                ..ChangeSet::default()
            });
        }

        let tracked = self.diff_section(false).await?;
        let untracked = self.untracked_section().await?;

        let mut change_set = ChangeSet {
            staged,
            tracked,
            untracked,
        };
        if change_set.is_empty() {
            return Err(ContextError::NoChanges);
        }

        if scope == ChangeScope::WorkingTree {
            change_set.staged = ChangeSection::new();
        }

        debug!(
            staged = change_set.staged.len(),
            tracked = change_set.tracked.len(),
            untracked = change_set.untracked.len(),
            "Assembled change set"
        );
        Ok(change_set)
    }

    /// Index-vs-HEAD (`staged`) or worktree-vs-index diff, split per file.
    async fn diff_section(&self, staged: bool) -> Result<ChangeSection, ContextError> {
        self.cancel.check()?;
        let diff = self
            .provider
            .diff(staged)
            .await
            .map_err(ContextError::Vcs)?;
        self.cancel.check()?;

        let mut section = ChangeSection::new();
        for record in split_by_file(&diff, SplitLimits::unlimited_files(self.max_chars_per_file)) {
            let path = record.file_path.trim();
            if path.is_empty() || path == UNKNOWN_FILE {
                debug!(staged, "Skipping diff record without a file path");
                continue;
            }
            section.push(path, record.excerpt);
        }
        Ok(section)
    }

    async fn untracked_section(&self) -> Result<ChangeSection, ContextError> {
        let root = self.provider.root();
        let mut section = ChangeSection::new();

        for path in self.discover_untracked().await? {
            self.cancel.check()?;

            let Some(relative) = repo_relative(root, &path) else {
                debug!(path = %path.display(), "Skipping untracked path outside repository");
                continue;
            };

            let content = match self.reader.read(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read untracked file");
                    continue;
                }
            };

            let record = build_added_file_record(&relative, &content, self.max_chars_per_file);
            section.push(record.file_path, record.excerpt);
        }

        Ok(section)
    }

    /// Untracked files, de-duplicated by absolute path and sorted.
    ///
    /// Each source is consulted only when the previous ones found nothing:
    /// the provider's untracked list, then its working-tree changes that
    /// describe new files, then `git ls-files --others`.
    async fn discover_untracked(&self) -> Result<Vec<PathBuf>, ContextError> {
        self.cancel.check()?;
        let root = self.provider.root();
        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();

        match self.provider.untracked_changes().await {
            Ok(paths) => insert_all(&mut found, paths),
            Err(e) => warn!(error = %e, "Untracked change list unavailable"),
        }

        if found.is_empty() {
            self.cancel.check()?;
            match self.provider.working_tree_changes().await {
                Ok(changes) => insert_all(
                    &mut found,
                    changes
                        .into_iter()
                        .filter(|change| change.status.is_new())
                        .map(|change| change.path),
                ),
                Err(e) => warn!(error = %e, "Working tree change list unavailable"),
            }
        }

        if found.is_empty() {
            self.cancel.check()?;
            match self.runner.execute(&LIST_UNTRACKED_ARGS, root).await {
                Ok(stdout) => insert_all(
                    &mut found,
                    parse_nul_delimited(&stdout)
                        .into_iter()
                        .map(|relative| root.join(relative)),
                ),
                Err(e) => warn!(error = %e, "Failed to list untracked files with git"),
            }
        }

        debug!(count = found.len(), "Discovered untracked files");
        Ok(found.into_values().collect())
    }
}

fn insert_all(found: &mut BTreeMap<String, PathBuf>, paths: impl IntoIterator<Item = PathBuf>) {
    for path in paths {
        found.insert(path.to_string_lossy().into_owned(), path);
    }
}

/// Forward-slash path of `path` relative to `root`, or `None` when it is
/// not strictly inside the root.
pub(crate) fn repo_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

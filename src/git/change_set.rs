//! The three change partitions gathered for one request.

use std::fmt;

use serde::Serialize;

/// Which partition of the working copy a section describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Changes recorded in the index (index vs HEAD).
    Staged,
    /// Unstaged edits to tracked files (worktree vs index).
    Tracked,
    /// Files with no history at all.
    Untracked,
}

impl SectionKind {
    /// All kinds in packing order.
    pub const ALL: [Self; 3] = [Self::Staged, Self::Tracked, Self::Untracked];

    /// Lowercase label used in fragment headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Tracked => "tracked",
            Self::Untracked => "untracked",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which partitions a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeScope {
    /// Staged, tracked and untracked changes.
    #[default]
    Full,
    /// Staged changes only; the other sections are never computed.
    StagedOnly,
    /// Tracked and untracked changes, with the staged section cleared.
    WorkingTree,
}

/// Index-aligned paths and diff texts for one partition.
///
/// Entries can only be added in pairs, so `paths()[i]` always belongs to
/// `diffs()[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSection {
    paths: Vec<String>,
    diffs: Vec<String>,
}

impl ChangeSection {
    /// Creates an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one `(path, diff)` entry.
    pub fn push(&mut self, path: impl Into<String>, diff: impl Into<String>) {
        self.paths.push(path.into());
        self.diffs.push(diff.into());
    }

    /// Repository-relative paths in entry order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Diff texts in entry order.
    pub fn diffs(&self) -> &[String] {
        &self.diffs
    }

    /// Iterates `(path, diff)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths
            .iter()
            .map(String::as_str)
            .zip(self.diffs.iter().map(String::as_str))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the section holds no entries.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Staged, tracked and untracked sections for one repository snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Index vs HEAD.
    pub staged: ChangeSection,
    /// Worktree vs index, tracked files only.
    pub tracked: ChangeSection,
    /// Untracked files rendered as added-file patches.
    pub untracked: ChangeSection,
}

impl ChangeSet {
    /// Returns the section for `kind`.
    pub fn section(&self, kind: SectionKind) -> &ChangeSection {
        match kind {
            SectionKind::Staged => &self.staged,
            SectionKind::Tracked => &self.tracked,
            SectionKind::Untracked => &self.untracked,
        }
    }

    /// Iterates sections in packing order.
    pub fn sections(&self) -> impl Iterator<Item = (SectionKind, &ChangeSection)> {
        SectionKind::ALL.into_iter().map(|kind| (kind, self.section(kind)))
    }

    /// True when all three sections are empty.
    pub fn is_empty(&self) -> bool {
        self.sections().all(|(_, section)| section.is_empty())
    }
}

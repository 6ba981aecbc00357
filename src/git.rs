//! Git change extraction and history queries.

pub mod assembler;
pub mod change_set;
pub mod diff_split;
pub mod history;
pub mod path_token;
pub mod process;
pub mod provider;
pub mod repository;
pub mod synthetic;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_utils;

pub use assembler::ChangeSetAssembler;
pub use change_set::{ChangeScope, ChangeSection, ChangeSet, SectionKind};
pub use diff_split::{split_by_file, DiffRecord, SplitLimits};
pub use history::{CommitRecord, HistoryAggregator, HistoryLimits, HistorySummary};
pub use process::{FsFileReader, GitCommandRunner};
pub use provider::{
    ChangeStatus, CommitEntry, FileReader, ProcessRunner, RepositoryProvider, WorkingTreeChange,
};
pub use repository::{select_repository, GitRepository};
pub use synthetic::build_added_file_record;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 7;

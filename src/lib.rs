//! # commit-context
//!
//! Extracts code-change context from a Git working copy and packs it into
//! ordered, size-bounded text fragments for a downstream text generator.
//!
//! ## Features
//!
//! - Per-file diff splitting with quoted-path header decoding
//! - Synthetic added-file patches for untracked and binary files
//! - Staged, tracked and untracked change assembly under cancellation
//! - De-duplicated recent-commit summaries across many files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use commit_context::cancel::CancellationSignal;
//! use commit_context::context::ContextPipeline;
//! use commit_context::git::{ChangeScope, FsFileReader, GitCommandRunner, GitRepository};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let repo = GitRepository::discover(".")?;
//! let cancel = CancellationSignal::new();
//! let context = ContextPipeline::new(&repo, &FsFileReader, &GitCommandRunner::default(), &cancel)
//!     .build_commit_context(ChangeScope::Full, "Write a commit message.")
//!     .await?;
//! for fragment in &context.fragments {
//!     println!("{}", fragment.body);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cancel;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::error::ContextError;

/// The current version of commit-context.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

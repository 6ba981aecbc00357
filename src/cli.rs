//! CLI interface for commit-context.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::ContextConfig;
use crate::git::{select_repository, GitRepository};

pub mod context;
pub mod history;

/// commit-context: gathers change and history context for commit messages.
#[derive(Parser)]
#[command(name = "commit-context")]
#[command(about = "Extracts bounded change context from a Git working copy", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Packs staged, tracked and untracked changes into context fragments.
    Context(context::ContextCommand),
    /// Summarizes recent commits touching the given files.
    History(history::HistoryCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Context(cmd) => cmd.execute().await,
            Commands::History(cmd) => cmd.execute().await,
        }
    }
}

/// Loads `--config FILE` when given, the default settings file otherwise.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ContextConfig> {
    match path {
        Some(path) => ContextConfig::load_from_path(path),
        None => ContextConfig::load(),
    }
}

/// Opens the repository a command applies to.
///
/// Each `--repo` directory is resolved to its enclosing repository; with
/// none given the current directory is used. When several distinct
/// repositories result, the one containing the current directory wins.
pub(crate) fn resolve_repository(dirs: &[PathBuf]) -> Result<GitRepository> {
    let cwd = env::current_dir().context("Failed to determine current directory")?;
    let starts = if dirs.is_empty() {
        vec![cwd.clone()]
    } else {
        dirs.to_vec()
    };

    let mut repos: Vec<GitRepository> = Vec::new();
    for start in &starts {
        let repo = GitRepository::discover(start)
            .with_context(|| format!("Failed to open git repository at {}", start.display()))?;
        if !repos.iter().any(|r| r.root_path() == repo.root_path()) {
            repos.push(repo);
        }
    }

    let roots: Vec<PathBuf> = repos.iter().map(|r| r.root_path().to_path_buf()).collect();
    let selected = select_repository(&roots, Some(&cwd))?;
    repos
        .into_iter()
        .find(|r| r.root_path() == selected)
        .context("Selected repository disappeared")
}

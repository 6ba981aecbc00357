//! History command: recent commits touching selected files.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cancel::CancellationSignal;
use crate::git::HistoryAggregator;

/// History command options.
#[derive(Parser)]
pub struct HistoryCommand {
    /// Directory inside the repository (repeatable; defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub repo: Vec<PathBuf>,

    /// Settings file (defaults to ~/.commit-context/settings.json).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Repository-relative paths to summarize.
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<String>,
}

impl HistoryCommand {
    /// Executes the history command.
    pub async fn execute(self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let repo = super::resolve_repository(&self.repo)?;
        let cancel = CancellationSignal::new();

        let summary = HistoryAggregator::new(&repo, &cancel)
            .with_limits(config.limits.history())
            .recent_commits_for_files(self.files.as_slice())
            .await?;

        println!("{summary}");
        Ok(())
    }
}

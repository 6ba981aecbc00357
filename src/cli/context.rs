//! Context command: packs the working copy into fragments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::cancel::CancellationSignal;
use crate::context::{CommitContext, ContextPipeline, TracingProgress};
use crate::error::ContextError;
use crate::git::{ChangeScope, FsFileReader, GitCommandRunner};

/// Line printed between fragments.
const FRAGMENT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────";

/// Context command options.
#[derive(Parser)]
pub struct ContextCommand {
    /// Directory inside the repository (repeatable; defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub repo: Vec<PathBuf>,

    /// Only consider staged changes.
    #[arg(long, conflicts_with = "working_tree")]
    pub staged: bool,

    /// Only consider working-tree changes (tracked and untracked).
    #[arg(long)]
    pub working_tree: bool,

    /// Task instructions appended to the closing fragment.
    #[arg(long, value_name = "TEXT")]
    pub instructions: Option<String>,

    /// Settings file (defaults to ~/.commit-context/settings.json).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit the full context as JSON instead of plain fragments.
    #[arg(long)]
    pub json: bool,
}

impl ContextCommand {
    fn scope(&self) -> ChangeScope {
        if self.staged {
            ChangeScope::StagedOnly
        } else if self.working_tree {
            ChangeScope::WorkingTree
        } else {
            ChangeScope::Full
        }
    }

    /// Executes the context command.
    pub async fn execute(self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let repo = super::resolve_repository(&self.repo)?;
        let runner = config
            .git_path
            .clone()
            .map(GitCommandRunner::new)
            .unwrap_or_default();
        let instructions = self
            .instructions
            .as_deref()
            .unwrap_or_else(|| config.instructions());

        let cancel = CancellationSignal::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("Interrupt received, cancelling");
                    cancel.cancel();
                }
            })
        };

        let progress = TracingProgress::new();
        let result = ContextPipeline::new(&repo, &FsFileReader, &runner, &cancel)
            .with_progress(&progress)
            .with_limits(config.limits)
            .build_commit_context(self.scope(), instructions)
            .await;
        watcher.abort();

        match result {
            Ok(context) => self.print(&context),
            Err(e) if e.is_benign() => {
                println!("{e}");
                Ok(())
            }
            Err(ContextError::Vcs(source)) => {
                Err(source.context("Failed to gather changes from the repository"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn print(&self, context: &CommitContext) -> Result<()> {
        if self.json {
            let json =
                serde_json::to_string_pretty(context).context("Failed to serialize context")?;
            println!("{json}");
            return Ok(());
        }

        for (index, fragment) in context.fragments.iter().enumerate() {
            if index > 0 {
                println!("{FRAGMENT_RULE}");
            }
            println!("{}", fragment.body);
        }
        Ok(())
    }
}

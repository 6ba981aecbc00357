//! End-to-end context building: assemble, analyze history, pack.

use serde::Serialize;
use tracing::debug;

use crate::cancel::CancellationSignal;
use crate::config::ContextLimits;
use crate::context::analysis::build_history_context;
use crate::context::pack::{ContextFragment, ContextPacker};
use crate::context::progress::{NoopProgress, ProgressReporter};
use crate::error::ContextError;
use crate::git::assembler::ChangeSetAssembler;
use crate::git::change_set::{ChangeScope, ChangeSet};
use crate::git::provider::{FileReader, ProcessRunner, RepositoryProvider};

/// Everything produced for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitContext {
    /// The assembled change set.
    pub change_set: ChangeSet,
    /// Output of the history context builder.
    pub history: String,
    /// Packed fragments, ready to hand to a generator.
    pub fragments: Vec<ContextFragment>,
}

/// Wires the assembler, history builder and packer together.
pub struct ContextPipeline<'a> {
    provider: &'a dyn RepositoryProvider,
    reader: &'a dyn FileReader,
    runner: &'a dyn ProcessRunner,
    cancel: &'a CancellationSignal,
    progress: &'a dyn ProgressReporter,
    limits: ContextLimits,
}

impl<'a> ContextPipeline<'a> {
    /// Creates a pipeline with default limits and no progress reporting.
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
            progress: &NoopProgress,
            limits: ContextLimits::default(),
        }
    }

    /// Reports steps to `progress`.
    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Overrides all size limits.
    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Runs the whole sequence for `scope`, ending the closing fragment
    /// with `instructions`.
    pub async fn build_commit_context(
        &self,
        scope: ChangeScope,
        instructions: &str,
    ) -> Result<CommitContext, ContextError> {
        self.progress.report("Analyzing changes", 10);
        let change_set =
            ChangeSetAssembler::new(self.provider, self.reader, self.runner, self.cancel)
                .with_max_chars_per_file(self.limits.max_chars_per_file)
                .assemble(scope)
                .await?;
        self.cancel.check()?;

        self.progress.report("Analyzing history", 10);
        let history = build_history_context(
            self.provider,
            self.cancel,
            &change_set,
            self.limits.history(),
        )
        .await?;
        self.cancel.check()?;

        self.progress.report("Packing context", 10);
        let fragments =
            ContextPacker::new(self.limits.pack()).pack(&change_set, &history, instructions);
        debug!(fragments = fragments.len(), "Packed commit context");

        Ok(CommitContext {
            change_set,
            history,
            fragments,
        })
    }
}

//! Turning a change set into packed context for a text generator.

pub mod analysis;
pub mod pack;
pub mod pipeline;
pub mod progress;

pub use analysis::build_history_context;
pub use pack::{ContextFragment, ContextPacker, FragmentLabel, PackLimits};
pub use pipeline::{CommitContext, ContextPipeline};
pub use progress::{NoopProgress, ProgressReporter, TracingProgress};

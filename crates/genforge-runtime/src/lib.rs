//! GenForge Runtime: turns a validated request into a stored artifact.
//!
//! Every request terminates with content: backend output when any backend
//! delivers, catalog or passthrough content otherwise. The only error that
//! escapes [`Orchestrator::generate`] is a failed artifact write.

pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod selector;
pub mod types;

pub use orchestrator::Orchestrator;
pub use pipeline::PipelineComposer;
pub use selector::FallbackSelector;
pub use types::*;

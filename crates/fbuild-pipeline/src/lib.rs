//! Build pipeline for fbuild.
//!
//! Sequences metadata loading, the build, the artifact rename and the optional
//! upload. Nothing here prints; progress is reported as [`PipelineEvent`]s.

pub mod orchestrator;
pub mod rename;

pub use orchestrator::{
    BuildPipeline, DestinationSource, PipelineError, PipelineEvent, PipelineOutcome, UploadOutcome,
};
pub use rename::{ArtifactRenamer, RenameError};

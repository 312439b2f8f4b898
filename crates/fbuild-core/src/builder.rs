//! Builder trait and build outcome types.
//!
//! Builders drive the external toolchain that turns a project into an artifact.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::{BuildMode, BuildRequest, BuildType, Result};

/// What to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Directory the build tool runs in.
    pub project_dir: PathBuf,
    pub build_type: BuildType,
    pub build_mode: BuildMode,
    /// Entry point file, relative to the project directory.
    pub target: String,
}

impl From<&BuildRequest> for BuildSpec {
    fn from(request: &BuildRequest) -> Self {
        Self {
            project_dir: request.project_dir.clone(),
            build_type: request.build_type,
            build_mode: request.build_mode,
            target: request.target.clone(),
        }
    }
}

/// Result of a finished build process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Exit code 0 and an empty error stream.
    pub success: bool,
    /// Exit code if the process exited normally.
    pub exit_code: Option<i32>,
    /// Everything the process wrote to its error stream.
    pub diagnostics: String,
}

/// A line of build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub stream: LogStream,
    pub content: String,
}

impl LogLine {
    pub fn new(stream: LogStream, content: impl Into<String>) -> Self {
        Self {
            stream,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Trait for artifact builders.
#[async_trait]
pub trait Builder: Send + Sync {
    /// Name of this builder.
    fn name(&self) -> &'static str;

    /// The command line that [`Builder::build`] runs, for display.
    fn command_line(&self, spec: &BuildSpec) -> Vec<String>;

    /// Run the build to completion, forwarding output lines as they arrive.
    ///
    /// A build that runs and fails is an `Ok` outcome with `success == false`;
    /// `Err` means the build could not be started at all.
    async fn build(&self, spec: &BuildSpec, logs: mpsc::Sender<LogLine>) -> Result<BuildOutcome>;
}

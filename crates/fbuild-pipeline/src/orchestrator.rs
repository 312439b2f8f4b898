//! Build pipeline orchestrator - runs metadata, build, rename and upload in order.

use async_trait::async_trait;
use fbuild_config::variables::DEFAULT_LAYOUT;
use fbuild_config::{ManifestError, PackageMetadata, VariableContextBuilder};
use fbuild_core::artifact::ArtifactLabel;
use fbuild_core::builder::{BuildSpec, Builder, LogLine};
use fbuild_core::uploader::{UploadDestination, Uploader};
use fbuild_core::{BuildRequest, Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::rename::{ArtifactRenamer, RenameError};

/// Event emitted during pipeline execution.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    MetadataLoaded { metadata: PackageMetadata },
    BuildStarted { command: Vec<String> },
    BuildLog(LogLine),
    BuildCompleted { success: bool },
    Renamed { path: PathBuf },
    UploadStarted { destination: UploadDestination },
    UploadProgress(u8),
    UploadCompleted { success: bool },
}

/// Supplies the base upload destination once an artifact is ready.
#[async_trait]
pub trait DestinationSource: Send + Sync {
    /// `None` when the user backs out.
    async fn base_destination(&self) -> Option<String>;
}

/// A destination known up front.
#[async_trait]
impl DestinationSource for String {
    async fn base_destination(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Failures that end a run before it can produce an outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Rename(#[from] RenameError),

    #[error("operation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Skipped,
    Uploaded { location: String },
    Failed { message: String },
}

/// How a run that reached its end went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    BuildFailed {
        exit_code: Option<i32>,
        diagnostics: String,
    },
    Completed {
        /// Where the renamed artifact was written in the project.
        artifact: PathBuf,
        upload: UploadOutcome,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PipelineOutcome::Completed { upload, .. } if !matches!(upload, UploadOutcome::Failed { .. })
        )
    }
}

/// Runs one build request end to end.
pub struct BuildPipeline {
    builder: Arc<dyn Builder>,
    uploader: Option<Arc<dyn Uploader>>,
    renamer: ArtifactRenamer,
    /// Destination layout below the user-supplied base.
    layout: String,
}

impl BuildPipeline {
    pub fn new(builder: Arc<dyn Builder>) -> Self {
        Self {
            builder,
            uploader: None,
            renamer: ArtifactRenamer::new(Arc::new(SystemClock)),
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>, layout: impl Into<String>) -> Self {
        self.uploader = Some(uploader);
        self.layout = layout.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.renamer = ArtifactRenamer::new(clock);
        self
    }

    /// Run the pipeline in a background task, returning a channel of events and
    /// a handle to get the final result.
    pub fn execute(
        self: Arc<Self>,
        request: BuildRequest,
        destinations: Arc<dyn DestinationSource>,
    ) -> (
        mpsc::Receiver<PipelineEvent>,
        tokio::task::JoinHandle<Result<PipelineOutcome, PipelineError>>,
    ) {
        let (tx, rx) = mpsc::channel(100);

        let handle =
            tokio::spawn(async move { self.run(&request, destinations.as_ref(), tx).await });

        (rx, handle)
    }

    /// Run the pipeline to completion on the current task.
    ///
    /// Events are sent on `events`; a dropped receiver does not stop the run.
    pub async fn run(
        &self,
        request: &BuildRequest,
        destinations: &dyn DestinationSource,
        events: mpsc::Sender<PipelineEvent>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let metadata = PackageMetadata::load(&request.manifest_path())?;
        info!(name = %metadata.name, version = %metadata.version, "Loaded package metadata");
        let _ = events
            .send(PipelineEvent::MetadataLoaded {
                metadata: metadata.clone(),
            })
            .await;

        // Build
        let spec = BuildSpec::from(request);
        let _ = events
            .send(PipelineEvent::BuildStarted {
                command: self.builder.command_line(&spec),
            })
            .await;

        let (log_tx, mut log_rx) = mpsc::channel(100);
        let forward_logs = async {
            while let Some(line) = log_rx.recv().await {
                let _ = events.send(PipelineEvent::BuildLog(line)).await;
            }
        };
        let (result, ()) = tokio::join!(self.builder.build(&spec, log_tx), forward_logs);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(builder = self.builder.name(), error = %e, "Build could not run");
                let _ = events
                    .send(PipelineEvent::BuildCompleted { success: false })
                    .await;
                return Ok(PipelineOutcome::BuildFailed {
                    exit_code: None,
                    diagnostics: e.to_string(),
                });
            }
        };

        let _ = events
            .send(PipelineEvent::BuildCompleted {
                success: outcome.success,
            })
            .await;
        if !outcome.success {
            return Ok(PipelineOutcome::BuildFailed {
                exit_code: outcome.exit_code,
                diagnostics: outcome.diagnostics,
            });
        }

        // Rename
        let label = ArtifactLabel {
            package_name: metadata.name.clone(),
            version: metadata.version.clone(),
            environment: request.environment,
            build_type: request.build_type,
        };
        let artifact = self
            .renamer
            .rename(&request.project_dir, request.build_mode, &label)
            .await?;
        let _ = events
            .send(PipelineEvent::Renamed {
                path: artifact.clone(),
            })
            .await;

        // Upload
        let uploader = match &self.uploader {
            Some(uploader) if request.upload => uploader,
            _ => {
                info!("Upload skipped");
                return Ok(PipelineOutcome::Completed {
                    artifact,
                    upload: UploadOutcome::Skipped,
                });
            }
        };

        let base = destinations
            .base_destination()
            .await
            .ok_or(PipelineError::Cancelled)?;

        let mut ctx = VariableContextBuilder::new()
            .with_package(&metadata)
            .with_environment(request.environment)
            .with_build(request.build_type, request.build_mode)
            .build();
        ctx.populate_env();
        let destination = uploader.destination(&base, &ctx.layout_path(&self.layout));

        let _ = events
            .send(PipelineEvent::UploadStarted {
                destination: destination.clone(),
            })
            .await;

        let (progress_tx, mut progress_rx) = mpsc::channel::<fbuild_core::uploader::UploadProgress>(100);
        let forward_progress = async {
            while let Some(progress) = progress_rx.recv().await {
                let _ = events
                    .send(PipelineEvent::UploadProgress(progress.percent))
                    .await;
            }
        };
        let (result, ()) = tokio::join!(
            uploader.upload(&artifact, &destination, progress_tx),
            forward_progress
        );

        let upload = match result {
            Ok(location) => {
                info!(uploader = uploader.name(), %location, "Upload complete");
                UploadOutcome::Uploaded { location }
            }
            Err(e) => {
                warn!(uploader = uploader.name(), error = %e, "Upload failed");
                UploadOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };
        let _ = events
            .send(PipelineEvent::UploadCompleted {
                success: matches!(upload, UploadOutcome::Uploaded { .. }),
            })
            .await;

        Ok(PipelineOutcome::Completed { artifact, upload })
    }
}

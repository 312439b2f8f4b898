//! Interactive build command.

use anyhow::Result;
use async_trait::async_trait;
use fbuild_config::{Settings, UploadSettings, UploadStrategy};
use fbuild_executor::FlutterBuilder;
use fbuild_pipeline::{BuildPipeline, DestinationSource, PipelineError};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

use crate::prompts::{self, PromptError, Prompter};
use crate::render::{self, Renderer};

/// Asks for the upload destination on stdin once the artifact has been shown.
struct PromptDestination {
    default: Option<String>,
    ready: Arc<Notify>,
}

#[async_trait]
impl DestinationSource for PromptDestination {
    async fn base_destination(&self) -> Option<String> {
        self.ready.notified().await;

        let default = self.default.clone();
        let answer = tokio::task::spawn_blocking(move || {
            let mut prompter = Prompter::stdio();
            prompts::ask_destination(&mut prompter, default.as_deref())
        })
        .await;

        match answer {
            Ok(Ok(destination)) => Some(destination),
            Ok(Err(PromptError::Cancelled)) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read destination");
                None
            }
            Err(e) => {
                warn!(error = %e, "Destination prompt panicked");
                None
            }
        }
    }
}

/// What the upload question calls the destination.
fn upload_target(settings: &UploadSettings) -> String {
    match &settings.strategy {
        UploadStrategy::Local => "destination".to_string(),
        UploadStrategy::Rclone { remote, .. } => remote.clone(),
    }
}

pub async fn run(settings: Settings) -> Result<ExitCode> {
    render::print_intro();

    let upload_target = upload_target(&settings.upload);
    let collected = {
        let mut prompter = Prompter::stdio();
        prompts::collect_request(
            &mut prompter,
            &settings.defaults,
            &format!("Upload to {}?", upload_target),
        )
    };
    let request = match collected {
        Ok(request) => request,
        Err(PromptError::Cancelled) => {
            render::print_cancelled();
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    let builder = Arc::new(FlutterBuilder::from_settings(&settings.flutter));
    let uploader = fbuild_deployer::from_settings(&settings.upload);
    let pipeline =
        Arc::new(BuildPipeline::new(builder).with_uploader(uploader, settings.upload.layout.clone()));

    let renamed = Arc::new(Notify::new());
    let destinations = Arc::new(PromptDestination {
        default: settings.upload.destination.clone(),
        ready: renamed.clone(),
    });

    let mut renderer = Renderer::new(request.clone(), upload_target, renamed);
    let (mut rx, handle) = pipeline.execute(request, destinations);

    while let Some(event) = rx.recv().await {
        renderer.handle(event);
    }

    match handle.await? {
        Ok(outcome) => {
            renderer.report(&outcome);
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(PipelineError::Cancelled) => {
            render::print_cancelled();
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e.into()),
    }
}

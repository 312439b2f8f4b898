//! rclone remote uploader.

use async_trait::async_trait;
use fbuild_core::uploader::*;
use fbuild_core::{Error, Result};
use std::path::{Component, Path};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::progress::{PercentParser, ProgressParser, RedrawBuffer};

/// Copies artifacts to a named rclone remote (OneDrive, S3, Drive, ...).
pub struct RcloneUploader {
    remote: String,
    program: String,
    /// Extra arguments placed before the `copy` subcommand.
    args: Vec<String>,
    parser: Arc<dyn ProgressParser>,
}

impl RcloneUploader {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            program: "rclone".to_string(),
            args: Vec::new(),
            parser: Arc::new(PercentParser),
        }
    }

    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    pub fn with_parser(mut self, parser: impl ProgressParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    fn transfer_args(&self, artifact: &Path, destination: &UploadDestination) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "copy".to_string(),
            artifact.display().to_string(),
            destination.to_string(),
            "--progress".to_string(),
        ]);
        args
    }
}

#[async_trait]
impl Uploader for RcloneUploader {
    fn name(&self) -> &'static str {
        "rclone"
    }

    fn destination(&self, base: &str, relative: &Path) -> UploadDestination {
        // Remote paths always use `/`, whatever the local platform.
        let mut parts: Vec<String> = Vec::new();
        let base = base.trim().trim_matches('/');
        if !base.is_empty() {
            parts.push(base.to_string());
        }
        parts.extend(relative.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        }));

        UploadDestination::Remote {
            remote: self.remote.clone(),
            path: parts.join("/"),
        }
    }

    async fn upload(
        &self,
        artifact: &Path,
        destination: &UploadDestination,
        progress: mpsc::Sender<UploadProgress>,
    ) -> Result<String> {
        if !matches!(destination, UploadDestination::Remote { .. }) {
            return Err(Error::InvalidInput(format!(
                "rclone uploader cannot handle {}",
                destination
            )));
        }

        let args = self.transfer_args(artifact, destination);
        info!(program = %self.program, ?args, "Starting transfer");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::ExecutionFailed(format!("failed to start {}: {}", self.program, e))
            })?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            Error::ExecutionFailed("transfer stdout was not captured".to_string())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            Error::ExecutionFailed("transfer stderr was not captured".to_string())
        })?;

        let mut out_buf = [0u8; 4096];
        let mut err_buf = [0u8; 4096];
        let mut out_redraws = RedrawBuffer::new();
        let mut err_redraws = RedrawBuffer::new();
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut last_percent = None;

        // Progress is redrawn in place, so read raw chunks rather than lines
        while stdout_open || stderr_open {
            let text = tokio::select! {
                read = stdout.read(&mut out_buf), if stdout_open => match read {
                    Ok(0) => {
                        stdout_open = false;
                        out_redraws.finish()
                    }
                    Ok(n) => out_redraws.push(&String::from_utf8_lossy(&out_buf[..n])),
                    Err(e) => {
                        warn!(error = %e, "Error reading transfer stdout");
                        stdout_open = false;
                        out_redraws.finish()
                    }
                },
                read = stderr.read(&mut err_buf), if stderr_open => match read {
                    Ok(0) => {
                        stderr_open = false;
                        err_redraws.finish()
                    }
                    Ok(n) => err_redraws.push(&String::from_utf8_lossy(&err_buf[..n])),
                    Err(e) => {
                        warn!(error = %e, "Error reading transfer stderr");
                        stderr_open = false;
                        err_redraws.finish()
                    }
                },
            };
            if text.is_empty() {
                continue;
            }

            debug!(output = %text.trim(), "Transfer output");
            if let Some(percent) = self.parser.parse(&text) {
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    let _ = progress.send(UploadProgress { percent }).await;
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            warn!(exit_code = ?status.code(), "Transfer failed");
            return Err(Error::TransferFailed {
                exit_code: status.code(),
            });
        }

        info!(destination = %destination, "Transfer complete");
        Ok(destination.to_string())
    }
}

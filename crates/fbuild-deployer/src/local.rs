//! Local directory uploader.

use async_trait::async_trait;
use fbuild_core::uploader::*;
use fbuild_core::{Error, Result};
use std::path::Path;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Moves artifacts into a directory, typically a mounted share.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalUploader;

impl LocalUploader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Uploader for LocalUploader {
    fn name(&self) -> &'static str {
        "local"
    }

    fn destination(&self, base: &str, relative: &Path) -> UploadDestination {
        UploadDestination::Local {
            path: Path::new(base).join(relative),
        }
    }

    async fn upload(
        &self,
        artifact: &Path,
        destination: &UploadDestination,
        progress: mpsc::Sender<UploadProgress>,
    ) -> Result<String> {
        let UploadDestination::Local { path: dir } = destination else {
            return Err(Error::InvalidInput(format!(
                "local uploader cannot handle {}",
                destination
            )));
        };

        let file_name = artifact
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("not a file: {}", artifact.display())))?;

        fs::create_dir_all(dir).await?;
        let target = dir.join(file_name);

        info!(from = %artifact.display(), to = %target.display(), "Moving artifact");
        if let Err(e) = fs::rename(artifact, &target).await {
            // Typically a move across filesystems
            warn!(error = %e, "Rename failed, copying instead");
            copy_then_remove(artifact, &target).await?;
        }

        let _ = progress.send(UploadProgress { percent: 100 }).await;
        Ok(target.display().to_string())
    }
}

/// Move `from` to `to` by copying and deleting the original.
///
/// A failed copy removes whatever part of `to` was written and returns the
/// error, leaving `from` untouched. Once the copy is complete the move counts
/// as done: if `from` then cannot be deleted, the artifact is left in both
/// places and a warning names the leftover file.
async fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    if let Err(e) = fs::copy(from, to).await {
        let _ = fs::remove_file(to).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(from).await {
        warn!(
            error = %e,
            copy = %to.display(),
            leftover = %from.display(),
            "Artifact copied but the original could not be removed"
        );
    }
    Ok(())
}

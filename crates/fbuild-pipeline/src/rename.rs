//! Renaming build output in place.

use fbuild_core::artifact::{ArtifactLabel, expected_output};
use fbuild_core::{BuildMode, Clock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::info;

#[derive(Debug, Error)]
pub enum RenameError {
    /// The build reported success but left nothing where the tool puts it.
    #[error("{} file not found at {}", kind, path.display())]
    Missing { kind: &'static str, path: PathBuf },

    #[error("failed to rename {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Gives freshly built artifacts a descriptive, timestamped name.
#[derive(Clone)]
pub struct ArtifactRenamer {
    clock: Arc<dyn Clock>,
}

impl ArtifactRenamer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Rename the artifact of a finished build and return its new absolute path.
    ///
    /// Nothing is touched when the expected file is absent.
    pub async fn rename(
        &self,
        project_dir: &Path,
        mode: BuildMode,
        label: &ArtifactLabel,
    ) -> Result<PathBuf, RenameError> {
        let source = project_dir.join(expected_output(label.build_type, mode));

        let exists = fs::try_exists(&source)
            .await
            .map_err(|e| RenameError::Io {
                path: source.clone(),
                source: e,
            })?;
        if !exists {
            return Err(RenameError::Missing {
                kind: label.build_type.label(),
                path: source,
            });
        }

        let file_name = label.file_name(&self.clock.stamp());
        let target = source.with_file_name(&file_name);

        fs::rename(&source, &target)
            .await
            .map_err(|e| RenameError::Io {
                path: source.clone(),
                source: e,
            })?;

        let target = fs::canonicalize(&target)
            .await
            .map_err(|e| RenameError::Io {
                path: target.clone(),
                source: e,
            })?;

        info!(from = %source.display(), to = %target.display(), "Renamed artifact");
        Ok(target)
    }
}

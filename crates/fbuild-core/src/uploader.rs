//! Uploader trait and destination types.
//!
//! Uploaders place a renamed artifact somewhere outside the project: a local
//! (often network-mounted) directory, or a named remote of a transfer tool.

use async_trait::async_trait;
use derive_more::Display;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::Result;

/// Where an artifact goes.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum UploadDestination {
    /// A directory on a mounted filesystem.
    #[display("{}", path.display())]
    Local { path: PathBuf },
    /// A path on a named remote, rendered as `remote:path`.
    #[display("{remote}:{path}")]
    Remote { remote: String, path: String },
}

/// Transfer progress reported by an uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Percentage complete, 0..=100.
    pub percent: u8,
}

/// Trait for upload back ends.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Name of this uploader.
    fn name(&self) -> &'static str;

    /// Combine the user-supplied base with the artifact's relative layout.
    fn destination(&self, base: &str, relative: &Path) -> UploadDestination;

    /// Place the artifact at the destination.
    ///
    /// Returns a printable location of the uploaded file.
    async fn upload(
        &self,
        artifact: &Path,
        destination: &UploadDestination,
        progress: mpsc::Sender<UploadProgress>,
    ) -> Result<String>;
}

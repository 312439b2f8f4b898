//! Upload backends for fbuild.
//!
//! Provides uploader implementations:
//! - Local directory (move)
//! - rclone remote (copy, with progress)

pub mod local;
pub mod progress;
pub mod rclone;

use fbuild_config::{UploadSettings, UploadStrategy};
use std::sync::Arc;

pub use fbuild_core::uploader::{UploadDestination, UploadProgress, Uploader};
pub use local::LocalUploader;
pub use progress::{NoProgress, PercentParser, ProgressParser, RedrawBuffer};
pub use rclone::RcloneUploader;

/// Construct the uploader selected by the configuration.
pub fn from_settings(settings: &UploadSettings) -> Arc<dyn Uploader> {
    match &settings.strategy {
        UploadStrategy::Local => Arc::new(LocalUploader::new()),
        UploadStrategy::Rclone {
            remote,
            program,
            args,
        } => Arc::new(
            RcloneUploader::new(remote.clone()).with_command(program.clone(), args.clone()),
        ),
    }
}

//! CLI command implementations.

pub mod build;

use anyhow::{Context, Result};
use fbuild_config::{Settings, UploadStrategy};
use std::path::Path;

use crate::render::{print_info, print_success};

pub fn validate(path: &Path) -> Result<()> {
    let settings = Settings::load(path)
        .with_context(|| format!("Invalid configuration: {}", path.display()))?;

    print_success("Configuration is valid");

    let flutter = std::iter::once(settings.flutter.program.as_str())
        .chain(settings.flutter.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    print_info(&format!("Flutter: {}", flutter));

    let defaults = &settings.defaults;
    print_info(&format!(
        "Defaults: project {}, target {}, {} / {} / {}",
        defaults.project, defaults.target, defaults.mode, defaults.environment, defaults.build_type
    ));

    let upload = match &settings.upload.strategy {
        UploadStrategy::Local => "local directory".to_string(),
        UploadStrategy::Rclone { remote, program, .. } => format!("{} remote {}", program, remote),
    };
    print_info(&format!("Upload: {}, layout {}", upload, settings.upload.layout));
    if let Some(destination) = &settings.upload.destination {
        print_info(&format!("Destination: {}", destination));
    }

    Ok(())
}

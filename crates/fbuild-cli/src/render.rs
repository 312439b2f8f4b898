//! Terminal rendering of pipeline events.
//!
//! Status lines use the same symbols throughout. The build runs under a
//! spinner with its output printed above it, and uploads get a percentage bar.

use fbuild_config::PackageMetadata;
use fbuild_core::BuildRequest;
use fbuild_core::builder::LogStream;
use fbuild_pipeline::{PipelineEvent, PipelineOutcome, UploadOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub mod symbols {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const INFO: &str = "•";
    pub const ARROW: &str = "→";
}

pub fn print_intro() {
    println!(
        "{}",
        " Flutter Build CLI ".if_supports_color(Stream::Stdout, |s| s.black().on_cyan().to_string())
    );
    println!();
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        message
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        "{} {}",
        symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
        message.if_supports_color(Stream::Stderr, |s| s.red())
    );
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
        message.if_supports_color(Stream::Stderr, |s| s.yellow())
    );
}

pub fn print_info(message: &str) {
    println!(
        "{} {}",
        symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
        message
    );
}

pub fn print_cancelled() {
    // Finish the prompt line that end of input left open
    eprintln!();
    println!(
        "{}",
        "Operation cancelled.".if_supports_color(Stream::Stdout, |s| s.yellow())
    );
}

/// A titled block of `key: value` lines.
pub fn print_note(title: &str, body: &str) {
    println!("┌ {}", title.if_supports_color(Stream::Stdout, |s| s.bold()));
    for line in body.lines() {
        println!("│ {}", line);
    }
    println!("└");
}

/// Summary shown once the package metadata is known.
pub fn build_information(
    request: &BuildRequest,
    metadata: &PackageMetadata,
    upload_target: &str,
) -> String {
    [
        format!("Package Name: {}", metadata.name),
        format!("Version: {}", metadata.version),
        format!("Build Mode: {}", request.build_mode),
        format!("Environment: {}", request.environment),
        format!("Build Type: {}", request.build_type),
        format!("Target: {}", request.target),
        format!(
            "Upload to {}: {}",
            upload_target,
            if request.upload { "Yes" } else { "No" }
        ),
    ]
    .join("\n")
}

/// Draws pipeline events as they arrive.
pub struct Renderer {
    request: BuildRequest,
    upload_target: String,
    /// Signalled once the renamed artifact has been reported.
    renamed: Arc<Notify>,
    spinner: Option<ProgressBar>,
    upload_bar: Option<ProgressBar>,
}

impl Renderer {
    pub fn new(request: BuildRequest, upload_target: impl Into<String>, renamed: Arc<Notify>) -> Self {
        Self {
            request,
            upload_target: upload_target.into(),
            renamed,
            spinner: None,
            upload_bar: None,
        }
    }

    pub fn handle(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::MetadataLoaded { metadata } => {
                print_note(
                    "Build Information",
                    &build_information(&self.request, &metadata, &self.upload_target),
                );
            }
            PipelineEvent::BuildStarted { command } => {
                print_info(&format!("Running command: {}", command.join(" ")));
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .template("{spinner:.green} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner.set_message("Building...");
                spinner.enable_steady_tick(Duration::from_millis(80));
                self.spinner = Some(spinner);
            }
            PipelineEvent::BuildLog(line) => {
                let content = match line.stream {
                    LogStream::Stdout => line.content,
                    LogStream::Stderr => line
                        .content
                        .if_supports_color(Stream::Stdout, |s| s.red())
                        .to_string(),
                };
                match &self.spinner {
                    Some(spinner) if !spinner.is_hidden() => spinner.println(content),
                    _ => println!("{}", content),
                }
            }
            PipelineEvent::BuildCompleted { success } => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_and_clear();
                }
                if success {
                    print_success("Build complete");
                } else {
                    print_error("Build failed");
                }
            }
            PipelineEvent::Renamed { path } => {
                print_note("Build Path", &format!("Build path: {}", path.display()));
                self.renamed.notify_one();
            }
            PipelineEvent::UploadStarted { destination } => {
                print_info(&format!("Uploading {} {}", symbols::ARROW, destination));
                let bar = ProgressBar::new(100);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{bar:40.cyan/blue} {pos:>3}%")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                );
                self.upload_bar = Some(bar);
            }
            PipelineEvent::UploadProgress(percent) => {
                if let Some(bar) = &self.upload_bar {
                    bar.set_position(u64::from(percent));
                }
            }
            PipelineEvent::UploadCompleted { .. } => {
                if let Some(bar) = self.upload_bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }

    /// Final status line for a run.
    pub fn report(&self, outcome: &PipelineOutcome) {
        match outcome {
            PipelineOutcome::BuildFailed {
                exit_code,
                diagnostics,
            } => {
                if !diagnostics.is_empty() {
                    print_note("Build Errors", diagnostics);
                }
                print_error(&format!(
                    "Build failed (exit code {})",
                    fbuild_core::error::exit_code_label(exit_code)
                ));
            }
            PipelineOutcome::Completed { artifact, upload } => match upload {
                UploadOutcome::Skipped => {
                    print_success(&format!("Build successful: {}", artifact.display()))
                }
                UploadOutcome::Uploaded { location } => {
                    print_success(&format!("Build successfully moved to {}", location))
                }
                UploadOutcome::Failed { message } => {
                    print_warning(&format!("Build kept at {}", artifact.display()));
                    print_error(&format!("Failed to move build to destination: {}", message));
                }
            },
        }
    }
}

//! fbuild: interactive Flutter build helper.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fbuild_config::Settings;
use fbuild_config::settings::CONFIG_FILE_NAME;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod prompts;
mod render;

#[derive(Parser)]
#[command(name = "fbuild", version)]
#[command(about = "Build, rename and distribute Flutter artifacts", long_about = None)]
struct Cli {
    /// Configuration file [default: ./fbuild.kdl if present]
    #[arg(long, global = true, env = "FBUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt for build parameters, then build, rename and upload (default)
    Build,
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        path: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            let settings = Settings::discover(cli.config.as_deref(), &cwd)
                .context("Failed to load configuration")?;
            commands::build::run(settings).await
        }
        Commands::Validate { path } => {
            let path = path
                .or(cli.config)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            commands::validate(&path)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            render::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

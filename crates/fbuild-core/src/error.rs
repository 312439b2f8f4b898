//! Error types for fbuild.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid build type: {0} (expected apk or appbundle)")]
    InvalidBuildType(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("transfer failed with exit code {}", exit_code_label(.exit_code))]
    TransferFailed { exit_code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render an optional process exit code; signals leave no code behind.
pub fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub type Result<T> = std::result::Result<T, Error>;

//! Build backends for fbuild.
//!
//! Provides builder implementations:
//! - Flutter CLI (`flutter build`)

pub mod flutter;

pub use fbuild_core::builder::{BuildOutcome, BuildSpec, Builder, LogLine, LogStream};
pub use flutter::FlutterBuilder;

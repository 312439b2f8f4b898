//! Core domain types and traits for fbuild.
//!
//! This crate contains:
//! - Build parameters (artifact type, mode, environment) and the build request
//! - Builder trait and build outcome types
//! - Uploader trait and destination types
//! - Artifact naming conventions and the timestamp formatter

pub mod artifact;
pub mod build;
pub mod builder;
pub mod error;
pub mod timestamp;
pub mod uploader;

pub use build::{BuildMode, BuildRequest, BuildType, Environment};
pub use error::{Error, Result};
pub use timestamp::{Clock, FixedClock, SystemClock};

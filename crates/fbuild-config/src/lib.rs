//! Manifest reading and KDL configuration parsing for fbuild.
//!
//! This crate handles:
//! - The Flutter package manifest (`pubspec.yaml`)
//! - Tool configuration (`fbuild.kdl`)
//! - Variable interpolation for destination layouts

pub mod error;
pub mod manifest;
pub mod settings;
pub mod variables;

pub use error::{ConfigError, ConfigResult, ManifestError};
pub use manifest::PackageMetadata;
pub use settings::{BuildDefaults, FlutterSettings, Settings, UploadSettings, UploadStrategy};
pub use variables::{VariableContext, VariableContextBuilder};

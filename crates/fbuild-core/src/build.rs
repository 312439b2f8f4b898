//! Build parameters and the build request.

use derive_more::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Kind of artifact produced by `flutter build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BuildType {
    /// Installable package (`.apk`).
    #[display("apk")]
    Apk,
    /// Distributable bundle (`.aab`).
    #[display("appbundle")]
    AppBundle,
}

impl BuildType {
    pub const ALL: [BuildType; 2] = [BuildType::Apk, BuildType::AppBundle];

    /// Conventional file extension of the artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            BuildType::Apk => "apk",
            BuildType::AppBundle => "aab",
        }
    }

    /// Human-readable label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            BuildType::Apk => "APK",
            BuildType::AppBundle => "App Bundle",
        }
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apk" => Ok(BuildType::Apk),
            "appbundle" | "aab" | "bundle" => Ok(BuildType::AppBundle),
            other => Err(Error::InvalidBuildType(other.to_string())),
        }
    }
}

/// Compilation profile passed to the build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BuildMode {
    #[display("debug")]
    Debug,
    #[display("profile")]
    Profile,
    #[display("release")]
    Release,
}

impl BuildMode {
    pub const ALL: [BuildMode; 3] = [BuildMode::Debug, BuildMode::Profile, BuildMode::Release];

    /// Command-line flag understood by `flutter build`.
    pub fn flag(&self) -> String {
        format!("--{}", self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildMode::Debug => "Debug",
            BuildMode::Profile => "Profile",
            BuildMode::Release => "Release",
        }
    }
}

impl FromStr for BuildMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "profile" => Ok(BuildMode::Profile),
            "release" => Ok(BuildMode::Release),
            other => Err(Error::InvalidInput(format!("unknown build mode: {}", other))),
        }
    }
}

/// Logical deployment target. Only used for labelling artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Environment {
    #[display("dev")]
    Dev,
    #[display("staging")]
    Staging,
    #[display("prod")]
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Staging, Environment::Prod];

    /// Uppercase tag embedded in artifact names.
    pub fn tag(&self) -> String {
        self.to_string().to_uppercase()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Environment::Dev => "Development",
            Environment::Staging => "Staging",
            Environment::Prod => "Production",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "staging" | "uat" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(Error::InvalidInput(format!("unknown environment: {}", other))),
        }
    }
}

/// Everything collected from the user for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Root of the Flutter project (contains `pubspec.yaml`).
    pub project_dir: PathBuf,
    pub build_type: BuildType,
    pub build_mode: BuildMode,
    pub environment: Environment,
    /// Entry point passed to `--target`, relative to the project.
    pub target: String,
    /// Whether the renamed artifact should be uploaded afterwards.
    pub upload: bool,
}

impl BuildRequest {
    /// Path of the manifest declaring package name and version.
    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join("pubspec.yaml")
    }
}

//! Tool configuration parsing (`fbuild.kdl`).
//!
//! ```kdl
//! flutter "fvm" "flutter"
//!
//! defaults {
//!     project "./"
//!     target "lib/main.dart"
//!     mode "debug"
//!     environment "dev"
//!     type "apk"
//! }
//!
//! upload "rclone" remote="onedrive" {
//!     program "rclone"
//!     args "--fast-list"
//!     destination "Builds"
//!     layout "${package.name}/${environment}/${package.version}"
//! }
//! ```
//!
//! Every node is optional; anything missing falls back to [`Settings::default`].

use crate::variables::DEFAULT_LAYOUT;
use crate::{ConfigError, ConfigResult};
use fbuild_core::{BuildMode, BuildType, Environment};
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "fbuild.kdl";

/// Complete tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub flutter: FlutterSettings,
    pub defaults: BuildDefaults,
    pub upload: UploadSettings,
}

/// How to invoke the Flutter toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlutterSettings {
    pub program: String,
    /// Arguments placed before `build` (e.g. `fvm flutter` → program `fvm`, args `["flutter"]`).
    pub args: Vec<String>,
}

impl Default for FlutterSettings {
    fn default() -> Self {
        Self {
            program: "flutter".to_string(),
            args: Vec::new(),
        }
    }
}

/// Values offered at each prompt when the user just presses enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDefaults {
    pub project: String,
    pub target: String,
    pub mode: BuildMode,
    pub environment: Environment,
    pub build_type: BuildType,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            project: "./".to_string(),
            target: "lib/main.dart".to_string(),
            mode: BuildMode::Debug,
            environment: Environment::Dev,
            build_type: BuildType::Apk,
        }
    }
}

/// Upload back end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStrategy {
    /// Move the artifact into a local directory.
    #[default]
    Local,
    /// Copy the artifact to a named rclone remote.
    Rclone {
        remote: String,
        program: String,
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub strategy: UploadStrategy,
    /// Default base destination offered at the prompt.
    pub destination: Option<String>,
    /// Relative layout below the base; see [`crate::variables`].
    pub layout: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            strategy: UploadStrategy::Local,
            destination: None,
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a specific file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = parse_settings(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(settings)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Otherwise `fbuild.kdl` in `dir` is used if
    /// present, and built-in defaults if not.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate: PathBuf = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!(dir = %dir.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }
}

/// Parse settings from KDL text.
pub fn parse_settings(kdl: &str) -> ConfigResult<Settings> {
    let doc: KdlDocument = kdl.parse()?;

    let mut settings = Settings::default();
    let mut seen_upload = false;

    for node in doc.nodes() {
        match node.name().value() {
            "flutter" => {
                settings.flutter = parse_flutter(node)?;
            }
            "defaults" => {
                settings.defaults = parse_defaults(node)?;
            }
            "upload" => {
                if seen_upload {
                    return Err(ConfigError::Duplicate("upload".to_string()));
                }
                seen_upload = true;
                settings.upload = parse_upload(node)?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(settings)
}

fn parse_flutter(node: &KdlNode) -> ConfigResult<FlutterSettings> {
    let mut args = get_all_string_args(node);
    if args.is_empty() {
        return Err(ConfigError::MissingField("flutter program".to_string()));
    }
    let program = args.remove(0);
    Ok(FlutterSettings { program, args })
}

fn parse_defaults(node: &KdlNode) -> ConfigResult<BuildDefaults> {
    let mut defaults = BuildDefaults::default();

    let Some(children) = node.children() else {
        return Ok(defaults);
    };

    for child in children.nodes() {
        let key = child.name().value();
        let Some(value) = get_first_string_arg(child) else {
            return Err(ConfigError::MissingField(format!("defaults.{}", key)));
        };
        match key {
            "project" => defaults.project = value,
            "target" => defaults.target = value,
            "mode" => defaults.mode = parse_value("defaults.mode", &value)?,
            "environment" => defaults.environment = parse_value("defaults.environment", &value)?,
            "type" => defaults.build_type = parse_value("defaults.type", &value)?,
            _ => {}
        }
    }

    Ok(defaults)
}

fn parse_upload(node: &KdlNode) -> ConfigResult<UploadSettings> {
    let kind = get_first_string_arg(node).unwrap_or_else(|| "local".to_string());

    let program = get_child_string(node, "program");
    let args = get_child_strings(node, "args");
    let destination = get_child_string(node, "destination");
    let layout = get_child_string(node, "layout").unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

    let strategy = match kind.as_str() {
        "local" => UploadStrategy::Local,
        "rclone" => {
            let remote = get_string_prop(node, "remote")
                .or_else(|| get_child_string(node, "remote"))
                .ok_or_else(|| ConfigError::MissingField("upload remote".to_string()))?;
            UploadStrategy::Rclone {
                remote,
                program: program.unwrap_or_else(|| "rclone".to_string()),
                args,
            }
        }
        other => {
            return Err(ConfigError::InvalidValue {
                field: "upload".to_string(),
                message: format!("unknown upload strategy: {}", other),
            });
        }
    };

    Ok(UploadSettings {
        strategy,
        destination,
        layout,
    })
}

fn parse_value<T>(field: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr<Err = fbuild_core::Error>,
{
    value.parse().map_err(|e: fbuild_core::Error| ConfigError::InvalidValue {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn get_child_string(node: &KdlNode, name: &str) -> Option<String> {
    node.children()?
        .nodes()
        .iter()
        .find(|child| child.name().value() == name)
        .and_then(get_first_string_arg)
}

fn get_child_strings(node: &KdlNode, name: &str) -> Vec<String> {
    node.children()
        .map(|children| {
            children
                .nodes()
                .iter()
                .filter(|child| child.name().value() == name)
                .flat_map(get_all_string_args)
                .collect()
        })
        .unwrap_or_default()
}

//! Package metadata from `pubspec.yaml`.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::ManifestError;

/// Name and version of the package being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Display name derived from the manifest identifier (`my_app` → `My App`).
    pub name: String,
    /// Identifier exactly as declared in the manifest.
    pub raw_name: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct RawPubspec {
    name: Option<String>,
    version: Option<serde_yaml::Value>,
}

impl PackageMetadata {
    /// Read metadata from a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse manifest text; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawPubspec =
            serde_yaml::from_str(content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let raw_name = raw
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ManifestError::MissingField {
                path: path.to_path_buf(),
                field: "name",
            })?;

        let version = raw
            .version
            .and_then(|v| scalar_to_string(&v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ManifestError::MissingField {
                path: path.to_path_buf(),
                field: "version",
            })?;

        let name = display_name(&raw_name);
        debug!(name = %name, version = %version, "Loaded package metadata");

        Ok(Self {
            name,
            raw_name,
            version,
        })
    }
}

/// Title-case a snake_case identifier: `my_cool_app` → `My Cool App`.
pub fn display_name(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// `version: 1.2` is a YAML float; keep whatever text the scalar carries.
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> Result<PackageMetadata, ManifestError> {
        PackageMetadata::parse(content, Path::new("pubspec.yaml"))
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("my_cool_app"), "My Cool App");
        assert_eq!(display_name("app"), "App");
        assert_eq!(display_name("my__app_"), "My App");
        assert_eq!(display_name("already_Title"), "Already Title");
    }

    #[test]
    fn test_parse_pubspec() {
        let meta = parse(
            r#"
name: my_cool_app
description: A new Flutter project.
version: 1.2.3+45

environment:
  sdk: ">=3.0.0 <4.0.0"
"#,
        )
        .unwrap();

        assert_eq!(meta.name, "My Cool App");
        assert_eq!(meta.raw_name, "my_cool_app");
        assert_eq!(meta.version, "1.2.3+45");
    }

    #[test]
    fn test_numeric_version() {
        let meta = parse("name: app\nversion: 2.5\n").unwrap();
        assert_eq!(meta.version, "2.5");
    }

    #[test]
    fn test_missing_name() {
        let err = parse("version: 1.0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField { field: "name", .. }
        ));
    }

    #[test]
    fn test_missing_version() {
        let err = parse("name: my_app\n").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField {
                field: "version",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = parse("name: [unclosed\n").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("pubspec.yaml");
        let err = PackageMetadata::load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
        assert!(err.to_string().contains("pubspec.yaml"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pubspec.yaml");
        std::fs::write(&path, "name: my_app\nversion: 1.0.0\n").unwrap();

        let meta = PackageMetadata::load(&path).unwrap();
        assert_eq!(meta.name, "My App");
        assert_eq!(meta.version, "1.0.0");
    }
}

//! Artifact naming conventions.
//!
//! `flutter build` writes its output to fixed locations under the project
//! directory; fbuild renames it to a descriptive name before distributing it.

use std::path::PathBuf;

use crate::{BuildMode, BuildType, Environment};

/// Output directory of `flutter build apk`, relative to the project.
pub const APK_OUTPUT_DIR: &str = "build/app/outputs/flutter-apk";

/// Parent of the per-mode output directories of `flutter build appbundle`.
pub const BUNDLE_OUTPUT_DIR: &str = "build/app/outputs/bundle";

/// Where the build tool leaves the artifact, relative to the project directory.
pub fn expected_output(build_type: BuildType, mode: BuildMode) -> PathBuf {
    let file_name = format!("app-{}.{}", mode, build_type.extension());
    match build_type {
        BuildType::Apk => PathBuf::from(APK_OUTPUT_DIR).join(file_name),
        BuildType::AppBundle => PathBuf::from(BUNDLE_OUTPUT_DIR)
            .join(mode.to_string())
            .join(file_name),
    }
}

/// Labelling inputs for a renamed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLabel {
    pub package_name: String,
    pub version: String,
    pub environment: Environment,
    pub build_type: BuildType,
}

impl ArtifactLabel {
    /// `"{PackageName} {ENV} {version} {stamp}.{ext}"`, with unsafe characters
    /// in the name and version replaced.
    pub fn file_name(&self, stamp: &str) -> String {
        format!(
            "{} {} {} {}.{}",
            sanitize_component(&self.package_name),
            self.environment.tag(),
            sanitize_component(&self.version),
            stamp,
            self.build_type.extension()
        )
    }
}

/// Make a string safe to use as a single path component.
///
/// Separators, characters reserved on Windows and control characters become
/// `_`. Surrounding whitespace and dots are trimmed so the result can never be
/// `.` or `..`.
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, version: &str) -> ArtifactLabel {
        ArtifactLabel {
            package_name: name.to_string(),
            version: version.to_string(),
            environment: Environment::Prod,
            build_type: BuildType::Apk,
        }
    }

    #[test]
    fn test_apk_release_output() {
        assert_eq!(
            expected_output(BuildType::Apk, BuildMode::Release),
            PathBuf::from("build/app/outputs/flutter-apk/app-release.apk")
        );
    }

    #[test]
    fn test_apk_debug_output() {
        assert_eq!(
            expected_output(BuildType::Apk, BuildMode::Debug),
            PathBuf::from("build/app/outputs/flutter-apk/app-debug.apk")
        );
    }

    #[test]
    fn test_bundle_output_is_per_mode() {
        assert_eq!(
            expected_output(BuildType::AppBundle, BuildMode::Release),
            PathBuf::from("build/app/outputs/bundle/release/app-release.aab")
        );
        assert_eq!(
            expected_output(BuildType::AppBundle, BuildMode::Profile),
            PathBuf::from("build/app/outputs/bundle/profile/app-profile.aab")
        );
    }

    #[test]
    fn test_file_name() {
        let name = label("My App", "1.0.0").file_name("(20240102-030405)");
        assert_eq!(name, "My App PROD 1.0.0 (20240102-030405).apk");
    }

    #[test]
    fn test_bundle_file_name_extension() {
        let mut l = label("My App", "2.1.0+7");
        l.build_type = BuildType::AppBundle;
        l.environment = Environment::Staging;
        assert_eq!(
            l.file_name("(20240102-030405)"),
            "My App STAGING 2.1.0+7 (20240102-030405).aab"
        );
    }

    #[test]
    fn test_file_name_strips_separators() {
        let name = label("Evil/App", "1.0/../x").file_name("(20240102-030405)");
        assert_eq!(name, "Evil_App PROD 1.0_.._x (20240102-030405).apk");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("plain"), "plain");
        assert_eq!(sanitize_component("a:b*c?d"), "a_b_c_d");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("  spaced  "), "spaced");
        assert_eq!(sanitize_component("tab\there"), "tab_here");
        assert_eq!(sanitize_component(""), "_");
    }
}

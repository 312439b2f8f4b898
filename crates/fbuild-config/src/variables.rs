//! Variable interpolation for upload destination layouts.
//!
//! Supports variables like:
//! - `${package.name}` - Display name (`My App`)
//! - `${package.raw_name}` - Manifest identifier (`my_app`)
//! - `${package.version}` - Package version
//! - `${environment}` - Environment, lowercase (`prod`)
//! - `${ENVIRONMENT}` - Environment, uppercase (`PROD`)
//! - `${build.type}` - `apk` or `appbundle`
//! - `${build.mode}` - `debug`, `profile` or `release`
//! - `${env.VAR_NAME}` - Environment variable

use fbuild_core::artifact::sanitize_component;
use fbuild_core::{BuildMode, BuildType, Environment};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::PackageMetadata;

/// Layout used when the configuration does not name one.
pub const DEFAULT_LAYOUT: &str = "${package.name}/${environment}/${package.version}";

/// Variable context containing all available variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    pub package: PackageContext,
    pub build: BuildContext,
    /// Environment variables
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct PackageContext {
    pub name: String,
    pub raw_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub environment: String,
    pub build_type: String,
    pub mode: String,
}

// Regex for matching ${...} variables
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)?)\}").unwrap()
});

impl VariableContext {
    /// Create a new empty variable context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate environment variables from the current process environment.
    pub fn populate_env(&mut self) {
        for (key, value) in std::env::vars() {
            self.env.insert(key, value);
        }
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, var_name: &str) -> Option<String> {
        let parts: Vec<&str> = var_name.split('.').collect();

        match parts.as_slice() {
            ["package", "name"] => Some(self.package.name.clone()),
            ["package", "raw_name"] => Some(self.package.raw_name.clone()),
            ["package", "version"] => Some(self.package.version.clone()),

            ["environment"] => Some(self.build.environment.clone()),
            ["ENVIRONMENT"] => Some(self.build.environment.to_uppercase()),

            ["build", "type"] => Some(self.build.build_type.clone()),
            ["build", "mode"] => Some(self.build.mode.clone()),

            ["env", name] => self.env.get(*name).cloned(),

            _ => None,
        }
    }

    /// Interpolate all variables in a string.
    /// Variables are specified as `${var_name}` or `${namespace.var_name}`.
    pub fn interpolate(&self, input: &str) -> String {
        VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| {
                let var_name = &caps[1];
                self.resolve(var_name)
                    .unwrap_or_else(|| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Expand a `/`-separated layout into a relative path.
    ///
    /// Each segment is interpolated and then sanitized on its own, so a value
    /// containing a separator can never add a directory level or escape the
    /// base. Empty segments are dropped.
    pub fn layout_path(&self, layout: &str) -> PathBuf {
        layout
            .split('/')
            .filter(|segment| !segment.trim().is_empty())
            .map(|segment| sanitize_component(&self.interpolate(segment)))
            .collect()
    }
}

/// Builder for creating VariableContext.
pub struct VariableContextBuilder {
    ctx: VariableContext,
}

impl VariableContextBuilder {
    pub fn new() -> Self {
        Self {
            ctx: VariableContext::new(),
        }
    }

    pub fn with_package(mut self, metadata: &PackageMetadata) -> Self {
        self.ctx.package = PackageContext {
            name: metadata.name.clone(),
            raw_name: metadata.raw_name.clone(),
            version: metadata.version.clone(),
        };
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.ctx.build.environment = environment.to_string();
        self
    }

    pub fn with_build(mut self, build_type: BuildType, mode: BuildMode) -> Self {
        self.ctx.build.build_type = build_type.to_string();
        self.ctx.build.mode = mode.to_string();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.env.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> VariableContext {
        self.ctx
    }
}

impl Default for VariableContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PackageMetadata {
        PackageMetadata {
            name: "My App".to_string(),
            raw_name: "my_app".to_string(),
            version: "1.0.0".to_string(),
        }
    }

    fn context() -> VariableContext {
        VariableContextBuilder::new()
            .with_package(&metadata())
            .with_environment(Environment::Prod)
            .with_build(BuildType::Apk, BuildMode::Release)
            .build()
    }

    #[test]
    fn test_basic_interpolation() {
        let result = context().interpolate("${package.name} ${ENVIRONMENT} ${package.version}");
        assert_eq!(result, "My App PROD 1.0.0");
    }

    #[test]
    fn test_build_variables() {
        let result = context().interpolate("${build.type}-${build.mode}-${package.raw_name}");
        assert_eq!(result, "apk-release-my_app");
    }

    #[test]
    fn test_env_variables() {
        let ctx = VariableContextBuilder::new()
            .with_env("TEAM", "mobile")
            .build();

        assert_eq!(ctx.interpolate("${env.TEAM}/builds"), "mobile/builds");
    }

    #[test]
    fn test_unknown_variable_preserved() {
        let ctx = VariableContext::new();
        let result = ctx.interpolate("Unknown: ${unknown.var}");
        assert_eq!(result, "Unknown: ${unknown.var}");
    }

    #[test]
    fn test_default_layout() {
        let path = context().layout_path(DEFAULT_LAYOUT);
        assert_eq!(path, PathBuf::from("My App").join("prod").join("1.0.0"));
    }

    #[test]
    fn test_layout_cannot_escape() {
        let ctx = VariableContextBuilder::new()
            .with_package(&PackageMetadata {
                name: "../../etc".to_string(),
                raw_name: "x".to_string(),
                version: "1/2".to_string(),
            })
            .with_environment(Environment::Dev)
            .build();

        let path = ctx.layout_path(DEFAULT_LAYOUT);
        assert_eq!(path.components().count(), 3);
        assert_eq!(path, PathBuf::from("_.._etc").join("dev").join("1_2"));
    }

    #[test]
    fn test_layout_skips_empty_segments() {
        let path = context().layout_path("/releases//${package.version}/");
        assert_eq!(path, PathBuf::from("releases").join("1.0.0"));
    }
}

//! Flutter CLI builder.

use async_trait::async_trait;
use fbuild_config::FlutterSettings;
use fbuild_core::builder::*;
use fbuild_core::{Error, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Runs `flutter build` on the local machine.
pub struct FlutterBuilder {
    program: String,
    /// Leading arguments placed before `build`.
    args: Vec<String>,
}

impl FlutterBuilder {
    /// Use `flutter` from `PATH`.
    pub fn new() -> Self {
        Self::with_command("flutter", Vec::new())
    }

    /// Use a custom launcher, e.g. `fvm flutter`.
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &FlutterSettings) -> Self {
        Self::with_command(settings.program.clone(), settings.args.clone())
    }

    fn build_args(&self, spec: &BuildSpec) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "build".to_string(),
            spec.build_type.to_string(),
            "--target".to_string(),
            spec.target.clone(),
            spec.build_mode.flag(),
        ]);
        args
    }
}

impl Default for FlutterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Builder for FlutterBuilder {
    fn name(&self) -> &'static str {
        "flutter"
    }

    fn command_line(&self, spec: &BuildSpec) -> Vec<String> {
        let mut line = vec![self.program.clone()];
        line.extend(self.build_args(spec));
        line
    }

    async fn build(&self, spec: &BuildSpec, logs: mpsc::Sender<LogLine>) -> Result<BuildOutcome> {
        let args = self.build_args(spec);
        info!(
            program = %self.program,
            ?args,
            dir = %spec.project_dir.display(),
            "Running build"
        );

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(&spec.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::ExecutionFailed(format!("failed to start {}: {}", self.program, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExecutionFailed("build stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExecutionFailed("build stderr was not captured".to_string()))?;

        let mut stdout_reader = BufReader::new(stdout);
        let mut stderr_reader = BufReader::new(stderr);
        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        let mut stderr_written = false;
        let mut diagnostics = Vec::new();

        // Stream output until both pipes close. A partial line stays in its
        // buffer across select iterations.
        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout_reader.read_until(b'\n', &mut out_buf), if stdout_open => {
                    match read {
                        Ok(0) => stdout_open = false,
                        Ok(_) => {
                            let line = decode_line(&out_buf);
                            out_buf.clear();
                            let _ = logs.send(LogLine::new(LogStream::Stdout, line)).await;
                        }
                        Err(e) => {
                            warn!(error = %e, "Error reading build stdout");
                            stdout_open = false;
                        }
                    }
                }
                read = stderr_reader.read_until(b'\n', &mut err_buf), if stderr_open => {
                    match read {
                        Ok(0) => stderr_open = false,
                        Ok(_) => {
                            stderr_written = true;
                            let line = decode_line(&err_buf);
                            err_buf.clear();
                            diagnostics.push(line.clone());
                            let _ = logs.send(LogLine::new(LogStream::Stderr, line)).await;
                        }
                        Err(e) => {
                            // An unreadable error stream still counts as error output
                            warn!(error = %e, "Error reading build stderr");
                            stderr_written = true;
                            stderr_open = false;
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        let exit_code = status.code();
        let success = status.success() && !stderr_written;

        if success {
            info!("Build succeeded");
        } else {
            warn!(
                ?exit_code,
                stderr_lines = diagnostics.len(),
                "Build failed"
            );
        }
        debug!(diagnostics = %diagnostics.join("\n"), "Build error stream");

        Ok(BuildOutcome {
            success,
            exit_code,
            diagnostics: diagnostics.join("\n"),
        })
    }
}

/// One line of tool output, without its terminator. Bytes that are not UTF-8
/// (a non-UTF-8 locale, for example) become replacement characters.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbuild_core::{BuildMode, BuildType};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn make_spec(dir: &Path) -> BuildSpec {
        BuildSpec {
            project_dir: dir.to_path_buf(),
            build_type: BuildType::Apk,
            build_mode: BuildMode::Release,
            target: "lib/main.dart".to_string(),
        }
    }

    /// A builder whose "flutter" is a shell script receiving the build args as `$@`.
    fn script_builder(script: &str) -> FlutterBuilder {
        FlutterBuilder::with_command(
            "sh",
            vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        )
    }

    async fn run(builder: &FlutterBuilder, dir: &Path) -> (Result<BuildOutcome>, Vec<LogLine>) {
        let (tx, mut rx) = mpsc::channel(100);
        let outcome = builder.build(&make_spec(dir), tx).await;
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        (outcome, lines)
    }

    #[test]
    fn test_command_line() {
        let builder = FlutterBuilder::new();
        let spec = make_spec(Path::new("."));
        assert_eq!(
            builder.command_line(&spec),
            vec![
                "flutter",
                "build",
                "apk",
                "--target",
                "lib/main.dart",
                "--release"
            ]
        );
    }

    #[test]
    fn test_command_line_with_launcher() {
        let builder = FlutterBuilder::from_settings(&FlutterSettings {
            program: "fvm".to_string(),
            args: vec!["flutter".to_string()],
        });
        let mut spec = make_spec(Path::new("."));
        spec.build_type = BuildType::AppBundle;
        spec.build_mode = BuildMode::Profile;

        assert_eq!(
            builder.command_line(&spec).join(" "),
            "fvm flutter build appbundle --target lib/main.dart --profile"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_build_streams_output() {
        let dir = tempfile::tempdir().unwrap();
        let builder = script_builder(r#"echo "Running Gradle task"; echo "$@""#);

        let (outcome, lines) = run(&builder, dir.path()).await;
        let outcome = outcome.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.diagnostics.is_empty());
        let contents: Vec<_> = lines.iter().map(|l| l.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "Running Gradle task",
                "build apk --target lib/main.dart --release"
            ]
        );
        assert!(lines.iter().all(|l| l.stream == LogStream::Stdout));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let builder = script_builder("echo compiling; exit 3");

        let (outcome, _) = run(&builder, dir.path()).await;
        let outcome = outcome.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_output_fails_even_on_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let builder = script_builder("echo 'Gradle task failed' >&2; exit 0");

        let (outcome, lines) = run(&builder, dir.path()).await;
        let outcome = outcome.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.diagnostics, "Gradle task failed");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].stream, LogStream::Stderr);
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"BUILD SUCCESSFUL\r\n"), "BUILD SUCCESSFUL");
        assert_eq!(decode_line(b"no terminator"), "no terminator");
        assert_eq!(decode_line(b"Gradle \xff failed\n"), "Gradle \u{FFFD} failed");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_stderr_still_fails() {
        let dir = tempfile::tempdir().unwrap();
        let builder = script_builder(r"printf 'Gradle \377 failed\n' >&2; exit 0");

        let (outcome, lines) = run(&builder, dir.path()).await;
        let outcome = outcome.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.diagnostics, "Gradle \u{FFFD} failed");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].stream, LogStream::Stderr);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_stdout_keeps_draining() {
        let dir = tempfile::tempdir().unwrap();
        // Far more than a pipe buffer after the bad byte
        let builder = script_builder(r"printf 'x\377\n'; head -c 300000 /dev/zero | tr '\0' a; echo");

        let build = run(&builder, dir.path());
        let (outcome, lines) = tokio::time::timeout(Duration::from_secs(30), build)
            .await
            .expect("build should not block on a full pipe");
        let outcome = outcome.unwrap();

        assert!(outcome.success);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].content, "x\u{FFFD}");
        assert_eq!(lines[1].content.len(), 300000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_stderr_keeps_draining() {
        let dir = tempfile::tempdir().unwrap();
        let builder = script_builder(
            r"printf 'x\377\n' >&2; head -c 300000 /dev/zero | tr '\0' a >&2; exit 0",
        );

        let build = run(&builder, dir.path());
        let (outcome, lines) = tokio::time::timeout(Duration::from_secs(30), build)
            .await
            .expect("build should not block on a full pipe");
        let outcome = outcome.unwrap();

        assert!(!outcome.success);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.stream == LogStream::Stderr));
        assert_eq!(lines[1].content.len(), 300000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let builder = script_builder("pwd");

        let (outcome, lines) = run(&builder, dir.path()).await;
        assert!(outcome.unwrap().success);

        let reported = PathBuf::from(&lines[0].content).canonicalize().unwrap();
        assert_eq!(reported, dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let builder = FlutterBuilder::with_command("fbuild-test-no-such-flutter", Vec::new());

        let (outcome, lines) = run(&builder, dir.path()).await;

        assert!(matches!(outcome, Err(Error::ExecutionFailed(_))));
        assert!(lines.is_empty());
    }
}

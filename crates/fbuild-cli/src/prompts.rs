//! Interactive prompts.
//!
//! Prompts read whole lines. Empty input takes the default, invalid input is
//! reported and asked again, and end of input cancels the run.

use fbuild_config::BuildDefaults;
use fbuild_core::{BuildMode, BuildRequest, BuildType, Environment};
use owo_colors::{OwoColorize, Stream};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stderr> {
    /// Read from stdin; prompts go to stderr so stdout carries only the report.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Result<String, PromptError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    fn ask(&mut self, message: &str, hint: Option<&str>) -> Result<String, PromptError> {
        let marker = "?".if_supports_color(Stream::Stderr, |s| s.cyan()).to_string();
        match hint {
            Some(hint) => write!(
                self.output,
                "{} {} {} ",
                marker,
                message,
                format!("({})", hint).if_supports_color(Stream::Stderr, |s| s.dimmed())
            )?,
            None => write!(self.output, "{} {} ", marker, message)?,
        }
        self.output.flush()?;
        self.read_answer()
    }

    fn complain(&mut self, problem: &str) -> Result<(), PromptError> {
        writeln!(
            self.output,
            "  {}",
            problem.if_supports_color(Stream::Stderr, |s| s.yellow())
        )?;
        Ok(())
    }

    /// Free text. `validate` returns the message shown for a rejected answer.
    pub fn text<F>(
        &mut self,
        message: &str,
        default: Option<&str>,
        validate: F,
    ) -> Result<String, PromptError>
    where
        F: Fn(&str) -> Result<(), String>,
    {
        loop {
            let answer = self.ask(message, default)?;
            let answer = match (answer.is_empty(), default) {
                (true, Some(default)) => default.to_string(),
                _ => answer,
            };
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(problem) => self.complain(&problem)?,
            }
        }
    }

    /// One of `options`, chosen by number, value or label.
    pub fn select<T>(
        &mut self,
        message: &str,
        options: &[(T, &str)],
        default: T,
    ) -> Result<T, PromptError>
    where
        T: Copy + PartialEq + Display,
    {
        for (index, (value, label)) in options.iter().enumerate() {
            let marker = if *value == default { "*" } else { " " };
            writeln!(self.output, "  {}{}) {}", marker, index + 1, label)?;
        }

        loop {
            let answer = self.ask(message, Some(default.to_string().as_str()))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match pick(options, &answer) {
                Some(value) => return Ok(value),
                None => self.complain(&format!("Pick 1-{} or a listed name.", options.len()))?,
            }
        }
    }

    pub fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.ask(message, Some(hint))?;
            match answer.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.complain("Answer yes or no.")?,
            }
        }
    }
}

fn pick<T>(options: &[(T, &str)], answer: &str) -> Option<T>
where
    T: Copy + Display,
{
    if let Ok(number) = answer.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .map(|(value, _)| *value);
    }
    options
        .iter()
        .find(|(value, label)| {
            value.to_string().eq_ignore_ascii_case(answer) || label.eq_ignore_ascii_case(answer)
        })
        .map(|(value, _)| *value)
}

fn require(what: &'static str) -> impl Fn(&str) -> Result<(), String> {
    move |value| {
        if value.is_empty() {
            Err(format!("Please enter {}.", what))
        } else {
            Ok(())
        }
    }
}

fn validate_target(value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err("Please enter a path.".to_string())
    } else if !value.contains(".dart") {
        Err("Please include the file name in the path.".to_string())
    } else {
        Ok(())
    }
}

/// Ask for everything a build needs, in order.
pub fn collect_request<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    defaults: &BuildDefaults,
    upload_question: &str,
) -> Result<BuildRequest, PromptError> {
    let project = prompter.text(
        "Enter the location of the Flutter project:",
        Some(defaults.project.as_str()),
        require("a project path"),
    )?;

    let mode_options: Vec<_> = BuildMode::ALL.iter().map(|m| (*m, m.label())).collect();
    let build_mode = prompter.select("Pick a build mode", &mode_options, defaults.mode)?;

    let env_options: Vec<_> = Environment::ALL.iter().map(|e| (*e, e.label())).collect();
    let environment = prompter.select("Pick an environment", &env_options, defaults.environment)?;

    let target = prompter.text(
        "Enter the path of the target file for the build:",
        Some(defaults.target.as_str()),
        validate_target,
    )?;

    let type_options: Vec<_> = BuildType::ALL.iter().map(|t| (*t, t.label())).collect();
    let build_type = prompter.select("Pick a build type", &type_options, defaults.build_type)?;

    let upload = prompter.confirm(upload_question, false)?;

    Ok(BuildRequest {
        project_dir: PathBuf::from(project),
        build_type,
        build_mode,
        environment,
        target,
        upload,
    })
}

/// Ask where the artifact should go.
pub fn ask_destination<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    default: Option<&str>,
) -> Result<String, PromptError> {
    prompter.text(
        "Enter the destination path to move the build:",
        default,
        require("a destination path"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn shown(prompter: &Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(&prompter.output).into_owned()
    }

    #[test]
    fn test_text_default_on_empty() {
        let mut p = prompter("\n");
        let answer = p.text("Project?", Some("./"), require("a path")).unwrap();
        assert_eq!(answer, "./");
    }

    #[test]
    fn test_text_reprompts_until_valid() {
        let mut p = prompter("lib/main\nlib/main_prod.dart\n");
        let answer = p.text("Target?", None, validate_target).unwrap();

        assert_eq!(answer, "lib/main_prod.dart");
        assert!(shown(&p).contains("Please include the file name in the path."));
    }

    #[test]
    fn test_text_without_default_rejects_empty() {
        let mut p = prompter("\n/mnt/builds\n");
        let answer = ask_destination(&mut p, None).unwrap();

        assert_eq!(answer, "/mnt/builds");
        assert!(shown(&p).contains("Please enter a destination path."));
    }

    #[test]
    fn test_end_of_input_cancels() {
        let mut p = prompter("");
        assert!(matches!(
            p.text("Project?", Some("./"), require("a path")),
            Err(PromptError::Cancelled)
        ));

        let mut p = prompter("");
        assert!(matches!(p.confirm("Upload?", false), Err(PromptError::Cancelled)));
    }

    #[test]
    fn test_select_by_number_name_or_label() {
        let options: Vec<_> = BuildMode::ALL.iter().map(|m| (*m, m.label())).collect();

        let mut p = prompter("3\n");
        assert_eq!(
            p.select("Mode?", &options, BuildMode::Debug).unwrap(),
            BuildMode::Release
        );

        let mut p = prompter("profile\n");
        assert_eq!(
            p.select("Mode?", &options, BuildMode::Debug).unwrap(),
            BuildMode::Profile
        );

        let mut p = prompter("\n");
        assert_eq!(
            p.select("Mode?", &options, BuildMode::Debug).unwrap(),
            BuildMode::Debug
        );
    }

    #[test]
    fn test_select_reprompts_on_unknown_choice() {
        let options: Vec<_> = BuildType::ALL.iter().map(|t| (*t, t.label())).collect();
        let mut p = prompter("7\nipa\napp bundle\n");

        assert_eq!(
            p.select("Type?", &options, BuildType::Apk).unwrap(),
            BuildType::AppBundle
        );
        assert_eq!(shown(&p).matches("Pick 1-2").count(), 2);
    }

    #[test]
    fn test_confirm() {
        assert!(prompter("y\n").confirm("Upload?", false).unwrap());
        assert!(!prompter("\n").confirm("Upload?", false).unwrap());
        assert!(prompter("maybe\nYES\n").confirm("Upload?", false).unwrap());
    }

    #[test]
    fn test_collect_request_with_defaults() {
        let mut p = prompter("\n\n\n\n\n\n");
        let request = collect_request(&mut p, &BuildDefaults::default(), "Upload?").unwrap();

        assert_eq!(
            request,
            BuildRequest {
                project_dir: PathBuf::from("./"),
                build_type: BuildType::Apk,
                build_mode: BuildMode::Debug,
                environment: Environment::Dev,
                target: "lib/main.dart".to_string(),
                upload: false,
            }
        );
    }

    #[test]
    fn test_collect_request_with_answers() {
        let mut p = prompter("../app\nrelease\nprod\nlib/main_prod.dart\n2\ny\n");
        let request = collect_request(&mut p, &BuildDefaults::default(), "Upload?").unwrap();

        assert_eq!(request.project_dir, PathBuf::from("../app"));
        assert_eq!(request.build_mode, BuildMode::Release);
        assert_eq!(request.environment, Environment::Prod);
        assert_eq!(request.target, "lib/main_prod.dart");
        assert_eq!(request.build_type, BuildType::AppBundle);
        assert!(request.upload);
    }

    #[test]
    fn test_collect_request_cancelled_midway() {
        let mut p = prompter("./\nrelease\n");
        assert!(matches!(
            collect_request(&mut p, &BuildDefaults::default(), "Upload?"),
            Err(PromptError::Cancelled)
        ));
    }
}

//! Validation of the parsed options
//!
//! Every rule is checked and reported before the caller decides to exit.
//! Nothing in here terminates the process.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use super::{OptionSet, FLAG_BUILD_NAME, FLAG_BUILD_PATH, FLAG_BUILD_TARGET, FLAG_PROJECT_PATH};
use crate::build::BuildTarget;

/// Build name used when `-customBuildName` is missing or empty
pub const DEFAULT_BUILD_NAME: &str = "TestBuild";

/// A validation rule that failed; each maps to a fixed exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    MissingProjectPath,
    MissingBuildTarget,
    UnknownBuildTarget(String),
    MissingOutputPath,
}

impl ValidationFailure {
    /// Process exit code expected by calling automation
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidationFailure::MissingProjectPath => 110,
            ValidationFailure::MissingBuildTarget => 120,
            ValidationFailure::UnknownBuildTarget(_) => 121,
            ValidationFailure::MissingOutputPath => 130,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::MissingProjectPath => write!(f, "Missing argument -{}", FLAG_PROJECT_PATH),
            ValidationFailure::MissingBuildTarget => write!(f, "Missing argument -{}", FLAG_BUILD_TARGET),
            ValidationFailure::UnknownBuildTarget(value) => write!(
                f,
                "Invalid argument -{}: \"{}\" is not a recognized build target",
                FLAG_BUILD_TARGET, value
            ),
            ValidationFailure::MissingOutputPath => write!(f, "Missing argument -{}", FLAG_BUILD_PATH),
        }
    }
}

/// Options that passed validation, with the required fields pulled out
#[derive(Debug, Clone)]
pub struct ValidatedOptions {
    pub options: OptionSet,
    pub project_path: PathBuf,
    pub target: BuildTarget,
    pub output_path: String,
    pub build_name: String,
}

/// Check the required flags and fill in defaults
///
/// On failure all failing rules are returned in table order; the first one
/// decides the exit code.
pub fn validate_options(
    mut options: OptionSet,
    log: &mut dyn Write,
) -> Result<ValidatedOptions, Vec<ValidationFailure>> {
    let mut failures = Vec::new();

    let project_path = options.get(FLAG_PROJECT_PATH).map(PathBuf::from);
    if project_path.is_none() {
        failures.push(ValidationFailure::MissingProjectPath);
    }

    let target = match options.get(FLAG_BUILD_TARGET) {
        None => {
            failures.push(ValidationFailure::MissingBuildTarget);
            None
        }
        Some(name) => match name.parse::<BuildTarget>() {
            Ok(target) => Some(target),
            Err(_) => {
                failures.push(ValidationFailure::UnknownBuildTarget(name.to_string()));
                None
            }
        },
    };

    let output_path = options.get(FLAG_BUILD_PATH).map(str::to_string);
    if output_path.is_none() {
        failures.push(ValidationFailure::MissingOutputPath);
    }

    for failure in &failures {
        let _ = writeln!(log, "{}", failure);
    }

    match options.get(FLAG_BUILD_NAME) {
        None => {
            let _ = writeln!(
                log,
                "Missing argument -{}, defaulting to {}.",
                FLAG_BUILD_NAME, DEFAULT_BUILD_NAME
            );
            options.insert(FLAG_BUILD_NAME, DEFAULT_BUILD_NAME);
        }
        Some("") => {
            let _ = writeln!(
                log,
                "Invalid argument -{}, defaulting to {}.",
                FLAG_BUILD_NAME, DEFAULT_BUILD_NAME
            );
            options.insert(FLAG_BUILD_NAME, DEFAULT_BUILD_NAME);
        }
        Some(_) => {}
    }

    match (project_path, target, output_path) {
        (Some(project_path), Some(target), Some(output_path)) if failures.is_empty() => {
            let build_name = options.get(FLAG_BUILD_NAME).unwrap_or(DEFAULT_BUILD_NAME).to_string();
            Ok(ValidatedOptions {
                options,
                project_path,
                target,
                output_path,
                build_name,
            })
        }
        _ => Err(failures),
    }
}

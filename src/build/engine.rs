//! External build engine
//!
//! The Unity editor runs as a child process. The builder hands it a JSON
//! request and reads back a JSON summary:
//!
//! ```text
//! <program> <args...> -builderRequest <request.json> -builderSummary <summary.json>
//! ```
//!
//! The request carries the resolved [`BuildProfile`] (including signing
//! secrets in clear) and the enabled scenes. The editor-side script writes
//! the [`BuildSummary`] before it exits.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{BuildEngine, BuildProfile, BuildSummary};
use crate::config::EngineConfig;
use crate::error::{hints, BuilderError};
use crate::exec::subprocess::{resolve_program, run_command};
use crate::utils::terminal::{create_spinner, print_error, print_info, print_warning};

/// Flag introducing the request file
pub const REQUEST_FLAG: &str = "-builderRequest";

/// Flag introducing the summary file
pub const SUMMARY_FLAG: &str = "-builderSummary";

#[derive(Serialize)]
struct BuildRequest<'a> {
    profile: &'a BuildProfile,
    scenes: &'a [String],
}

/// Engine driven through a child process
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    /// Resolve the configured engine program
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let program = resolve_program(&config.program).ok_or_else(|| {
            BuilderError::missing_tool(&config.program, "running the player build", hints::engine())
        })?;
        Ok(Self {
            program,
            args: config.args.clone(),
        })
    }
}

impl BuildEngine for ProcessEngine {
    fn build(&mut self, profile: &BuildProfile, scenes: &[String]) -> Result<BuildSummary> {
        let workdir = tempfile::tempdir()
            .map_err(|e| BuilderError::engine("Failed to create request directory", Some(e.into())))?;
        let request_path = workdir.path().join("request.json");
        let summary_path = workdir.path().join("summary.json");

        let request = serde_json::to_string_pretty(&BuildRequest { profile, scenes })
            .context("Failed to serialize build request")?;
        std::fs::write(&request_path, request)
            .map_err(|e| BuilderError::engine("Failed to write build request", Some(e.into())))?;

        let mut args = self.args.clone();
        args.push(REQUEST_FLAG.to_string());
        args.push(request_path.to_string_lossy().into_owned());
        args.push(SUMMARY_FLAG.to_string());
        args.push(summary_path.to_string_lossy().into_owned());

        print_info(&format!("Building {} scene(s) for {}", scenes.len(), profile.target));
        let spinner = create_spinner(&format!("Running {}", self.program.display()));
        let started = Instant::now();
        let outcome = run_command(&self.program, &args);
        spinner.finish_and_clear();

        let output = match outcome {
            Ok(output) => output,
            Err(e) => {
                print_error(&format!("{:#}", e));
                return Ok(BuildSummary::failed(started.elapsed()));
            }
        };
        if !output.stdout.is_empty() {
            print!("{}", output.stdout);
        }
        if !output.stderr.is_empty() {
            eprint!("{}", output.stderr);
        }

        if !output.success {
            print_warning(&format!("Engine exited with code {}", output.exit_code));
        }
        if !summary_path.is_file() {
            print_error(&format!(
                "Engine exited with code {} without writing a build summary",
                output.exit_code
            ));
            return Ok(BuildSummary::failed(output.duration));
        }
        read_summary(&summary_path)
    }
}

fn read_summary(path: &Path) -> Result<BuildSummary> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BuilderError::engine("Failed to read build summary", Some(e.into())))?;
    serde_json::from_str(&content)
        .map_err(|e| BuilderError::engine("Malformed build summary", Some(e.into())).into())
}

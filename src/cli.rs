//! Command-line entry: one pass from raw arguments to a process exit code
//!
//! ```text
//! parse → validate → profile → prepare → engine → post-build → report
//! ```
//!
//! Nothing below this module terminates the process; every outcome is
//! turned into an exit code here and handed to `main`.

use std::io::Write;

use anyhow::Result;

use crate::build::engine::ProcessEngine;
use crate::build::platforms::get_platform;
use crate::build::profile::resolve_profile;
use crate::build::report::{exit_code, format_summary, result_message};
use crate::build::scenes::{EditorBuildSettings, SceneSource};
use crate::build::{BuildEngine, BuildResult};
use crate::config::BuilderConfig;
use crate::error::report_error;
use crate::options::{parse_arguments, validate_options, ValidatedOptions, ValidationFailure};
use crate::utils::terminal::{print_success, print_warning};

/// Exit code for execution errors (filesystem, project file, configuration)
pub const EXIT_EXECUTION_ERROR: i32 = 1;

/// Run the builder with the process arguments (including argv[0])
pub fn run<S: AsRef<str>>(args: &[S]) -> i32 {
    let mut stdout = std::io::stdout();
    run_with(args, &mut stdout, |config| {
        let engine: Box<dyn BuildEngine> = Box::new(ProcessEngine::from_config(&config.engine)?);
        Ok(engine)
    })
}

/// Run with an injected log sink and engine factory
///
/// The factory is only called once the options are valid and the profile
/// has been resolved.
pub fn run_with<S, F>(args: &[S], log: &mut dyn Write, make_engine: F) -> i32
where
    S: AsRef<str>,
    F: FnOnce(&BuilderConfig) -> Result<Box<dyn BuildEngine>>,
{
    let options = parse_arguments(args, log);
    let validated = match validate_options(options, log) {
        Ok(validated) => validated,
        Err(failures) => {
            return failures
                .first()
                .map_or(EXIT_EXECUTION_ERROR, ValidationFailure::exit_code)
        }
    };

    match execute(&validated, make_engine) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            EXIT_EXECUTION_ERROR
        }
    }
}

fn execute<F>(validated: &ValidatedOptions, make_engine: F) -> Result<i32>
where
    F: FnOnce(&BuilderConfig) -> Result<Box<dyn BuildEngine>>,
{
    let profile = resolve_profile(validated)?;
    let config = BuilderConfig::load(&validated.project_path)?;
    let scenes = EditorBuildSettings::new(config.scene_settings_path(&validated.project_path))
        .enabled_scenes()?;
    let mut engine = make_engine(&config)?;

    let platform = get_platform(profile.target);
    platform.prepare(&profile)?;

    let summary = engine.build(&profile, &scenes)?;
    let succeeded = summary.result == BuildResult::Succeeded;
    if succeeded {
        platform.post_build(&profile)?;
    } else {
        print_warning(&format!(
            "Build did not succeed, skipping {} post-build steps",
            platform.platform_name()
        ));
    }

    // Reported only once post-build steps are done
    print!("{}", format_summary(&summary));
    if succeeded {
        print_success(result_message(summary.result));
    } else {
        println!("{}", result_message(summary.result));
    }

    Ok(exit_code(summary.result))
}

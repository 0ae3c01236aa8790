//! Subprocess execution

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Output of a finished child process
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code, -1 when terminated by a signal
    pub exit_code: i32,

    pub stdout: String,
    pub stderr: String,

    /// Wall-clock time until the child exited
    pub duration: Duration,
}

/// Run a command to completion with stdin closed and its output captured
pub fn run_command(program: &Path, args: &[String]) -> Result<CommandResult> {
    let start = Instant::now();

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute {}", program.display()))?;

    Ok(CommandResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: start.elapsed(),
    })
}

/// Resolve a program name through PATH, or check an explicit path
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_run_command_captures_output() {
        let sh = resolve_program("sh").unwrap();
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let result = run_command(&sh, &args).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_closes_stdin() {
        // A child reading stdin sees EOF instead of waiting on the terminal
        let sh = resolve_program("sh").unwrap();
        let args = vec!["-c".to_string(), "cat; echo done".to_string()];
        let result = run_command(&sh, &args).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "done");
    }

    #[test]
    fn test_run_missing_program_fails() {
        assert!(run_command(Path::new("/nonexistent/unity-editor"), &[]).is_err());
    }

    #[test]
    fn test_resolve_missing_program() {
        assert_eq!(resolve_program("definitely-not-a-unity-editor-binary"), None);
    }
}

//! Build summary output and exit codes

use std::time::Duration;

use super::{BuildResult, BuildSummary};
use crate::utils::terminal::banner;

/// Exit code of a failed build
pub const EXIT_BUILD_FAILED: i32 = 101;
/// Exit code of a cancelled build
pub const EXIT_BUILD_CANCELLED: i32 = 102;
/// Exit code of a build whose result is not recognized
pub const EXIT_BUILD_UNKNOWN: i32 = 103;

/// Process exit code for a build result
pub fn exit_code(result: BuildResult) -> i32 {
    match result {
        BuildResult::Succeeded => 0,
        BuildResult::Failed => EXIT_BUILD_FAILED,
        BuildResult::Cancelled => EXIT_BUILD_CANCELLED,
        BuildResult::Unknown => EXIT_BUILD_UNKNOWN,
    }
}

/// Final line describing the result
pub fn result_message(result: BuildResult) -> &'static str {
    match result {
        BuildResult::Succeeded => "Build succeeded!",
        BuildResult::Failed => "Build failed!",
        BuildResult::Cancelled => "Build cancelled!",
        BuildResult::Unknown => "Build result is unknown!",
    }
}

/// Summary block printed after the engine returns
pub fn format_summary(summary: &BuildSummary) -> String {
    format!(
        "{}\nDuration: {}\nWarnings: {}\nErrors: {}\nSize: {} bytes\n",
        banner("Build results"),
        format_duration(summary.total_time),
        summary.total_warnings,
        summary.total_errors,
        summary.total_size
    )
}

/// Render as `HH:MM:SS.fffffff` (100ns ticks); hours are not wrapped into days
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let ticks = duration.subsec_nanos() / 100;
    format!(
        "{:02}:{:02}:{:02}.{:07}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        ticks
    )
}

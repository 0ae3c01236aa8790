//! Command-line options
//!
//! The builder is launched by outer automation with Unity-style flags
//! (`-projectPath /p -buildTarget Android ...`) mixed with flags meant for
//! other tools. Unknown flags are kept, never rejected, so this does not go
//! through clap.

pub mod validation;

use std::collections::BTreeMap;
use std::io::Write;

use crate::utils::terminal::banner;

pub use validation::{validate_options, ValidatedOptions, ValidationFailure};

/// Flags whose values must never be printed
pub const SECRET_FLAGS: &[&str] = &["androidKeystorePass", "androidKeyaliasName", "androidKeyaliasPass"];

/// Marker printed in place of a secret value
pub const HIDDEN_VALUE: &str = "*HIDDEN*";

// Flag names understood by the builder
pub const FLAG_PROJECT_PATH: &str = "projectPath";
pub const FLAG_BUILD_TARGET: &str = "buildTarget";
pub const FLAG_BUILD_PATH: &str = "customBuildPath";
pub const FLAG_BUILD_NAME: &str = "customBuildName";
pub const FLAG_BUILD_VERSION: &str = "buildVersion";
pub const FLAG_VERSION_CODE: &str = "androidVersionCode";
pub const FLAG_KEYSTORE_NAME: &str = "androidKeystoreName";
pub const FLAG_KEYSTORE_PASS: &str = "androidKeystorePass";
pub const FLAG_KEYALIAS_NAME: &str = "androidKeyaliasName";
pub const FLAG_KEYALIAS_PASS: &str = "androidKeyaliasPass";

/// Whether values of `flag` must be redacted
pub fn is_secret(flag: &str) -> bool {
    SECRET_FLAGS.contains(&flag)
}

/// Flag name to value, last occurrence wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    values: BTreeMap<String, String>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, overwriting an earlier one for the same flag
    pub fn insert(&mut self, flag: impl Into<String>, value: impl Into<String>) {
        self.values.insert(flag.into(), value.into());
    }

    pub fn get(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(String::as_str)
    }

    /// Value of `flag` when present and non-empty
    pub fn non_empty(&self, flag: &str) -> Option<&str> {
        self.get(flag).filter(|v| !v.is_empty())
    }

}

/// Parse raw process arguments (including argv[0]) into an [`OptionSet`]
///
/// A token starting with `-` is a flag; the following token is its value
/// unless it is missing or is itself a flag, in which case the value is
/// empty. Every token is visited once, so a consumed value is looked at
/// again on the next iteration and skipped because it has no dash.
///
/// Each flag is echoed to `log` with secret values redacted.
pub fn parse_arguments<S: AsRef<str>>(args: &[S], log: &mut dyn Write) -> OptionSet {
    let mut options = OptionSet::new();

    let _ = writeln!(log, "{}", banner("Parsing settings"));

    for (current, token) in args.iter().enumerate() {
        let token = token.as_ref();
        if !token.starts_with('-') {
            continue;
        }
        let flag = token.trim_start_matches('-');

        let value = match args.get(current + 1).map(AsRef::as_ref) {
            Some(next) if !next.starts_with('-') => next.trim_start_matches('-'),
            _ => "",
        };

        let display_value = if is_secret(flag) {
            HIDDEN_VALUE.to_string()
        } else {
            format!("\"{}\"", value)
        };
        let _ = writeln!(log, "Found flag \"{}\" with value {}.", flag, display_value);

        options.insert(flag, value);
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (OptionSet, String) {
        let mut log = Vec::new();
        let options = parse_arguments(args, &mut log);
        (options, String::from_utf8(log).unwrap())
    }

    #[test]
    fn test_flag_with_value() {
        let (options, _) = parse(&["Unity", "-projectPath", "/p", "-buildTarget", "Android"]);
        assert_eq!(options.get("projectPath"), Some("/p"));
        assert_eq!(options.get("buildTarget"), Some("Android"));
        assert_eq!(options.get("Unity"), None);
    }

    #[test]
    fn test_flag_without_value() {
        let (options, _) = parse(&["Unity", "-batchmode", "-quit", "-projectPath", "/p", "-nographics"]);
        assert_eq!(options.get("batchmode"), Some(""));
        assert_eq!(options.get("quit"), Some(""));
        assert_eq!(options.get("projectPath"), Some("/p"));
        assert_eq!(options.get("nographics"), Some(""));
    }

    #[test]
    fn test_leading_dashes_stripped() {
        let (options, _) = parse(&["--projectPath", "/p", "---weird"]);
        assert_eq!(options.get("projectPath"), Some("/p"));
        assert_eq!(options.get("weird"), Some(""));
    }

    #[test]
    fn test_executable_path_ignored() {
        let (options, _) = parse(&["/Applications/Unity", "stray", "-x"]);
        let mut expected = OptionSet::new();
        expected.insert("x", "");
        assert_eq!(options, expected);
    }

    #[test]
    fn test_duplicate_flag_last_wins() {
        let (options, _) = parse(&["-buildTarget", "iOS", "-buildTarget", "Android", "-buildTarget"]);
        assert_eq!(options.get("buildTarget"), Some(""));

        let (options, _) = parse(&["-buildTarget", "", "-buildTarget", "Android"]);
        assert_eq!(options.get("buildTarget"), Some("Android"));
    }

    #[test]
    fn test_value_is_not_reparsed_as_flag() {
        let (options, _) = parse(&["-customBuildName", "projectPath", "-x", "y"]);
        assert_eq!(options.get("customBuildName"), Some("projectPath"));
        assert_eq!(options.get("projectPath"), None);
        assert_eq!(options.get("x"), Some("y"));
    }

    #[test]
    fn test_empty_args() {
        let args: [&str; 0] = [];
        let (options, _) = parse(&args);
        assert_eq!(options, OptionSet::new());
    }

    #[test]
    fn test_flags_are_logged() {
        let (_, log) = parse(&["-projectPath", "/p", "-quit"]);
        assert!(log.contains("Parsing settings"));
        assert!(log.contains("Found flag \"projectPath\" with value \"/p\"."));
        assert!(log.contains("Found flag \"quit\" with value \"\"."));
    }

    #[test]
    fn test_secret_values_are_redacted() {
        let (options, log) = parse(&[
            "-androidKeystoreName",
            "release.keystore",
            "-androidKeystorePass",
            "hunter2",
            "-androidKeyaliasName",
            "projectPath",
            "-androidKeyaliasPass",
            "Found flag",
        ]);
        assert_eq!(options.get("androidKeystorePass"), Some("hunter2"));
        assert_eq!(options.get("androidKeyaliasPass"), Some("Found flag"));
        assert!(!log.contains("hunter2"));
        assert!(!log.contains("\"projectPath\""));
        assert!(!log.contains("\"Found flag\""));
        assert!(log.contains("Found flag \"androidKeystorePass\" with value *HIDDEN*."));
        assert!(log.contains("\"release.keystore\""));
    }

    #[test]
    fn test_non_empty() {
        let (options, _) = parse(&["-a", "-b", "x"]);
        assert_eq!(options.non_empty("a"), None);
        assert_eq!(options.non_empty("b"), Some("x"));
        assert_eq!(options.non_empty("c"), None);
    }
}

//! Error types and helpers for user-friendly error messages
//!
//! Execution errors carry an optional hint so that the single exit point in
//! `main` can tell the calling automation what to fix.

use std::path::PathBuf;

use thiserror::Error;

/// Execution errors raised after the options have been validated
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Builder configuration file errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// Engine executable not found or misconfigured
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// A flag was present but its value cannot be used
    #[error("Invalid argument -{flag}: {message}")]
    InvalidOption {
        flag: String,
        message: String,
        hint: Option<String>,
    },

    /// Moving or deleting build output failed
    #[error("Failed to {action} {}", path.display())]
    Relocation {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build engine could not be driven
    #[error("Engine error: {message}")]
    Engine {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The generated native project file could not be read or patched
    #[error("Project file error in {}: {message}", path.display())]
    ProjectFile {
        path: PathBuf,
        message: String,
        hint: Option<String>,
    },
}

impl BuilderError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid option error with a hint
    pub fn invalid_option(
        flag: impl Into<String>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            flag: flag.into(),
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a relocation error for a failed move or delete
    pub fn relocation(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Relocation {
            action,
            path: path.into(),
            source,
        }
    }

    /// Create an engine error
    pub fn engine(message: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::Engine {
            message: message.into(),
            source,
        }
    }

    /// Create a project file error with hint
    pub fn project_file_with_hint(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::ProjectFile {
            path: path.into(),
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// The hint shown below the error, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            BuilderError::Config { hint, .. }
            | BuilderError::InvalidOption { hint, .. }
            | BuilderError::ProjectFile { hint, .. } => hint.as_deref(),
            BuilderError::MissingTool { hint, .. } => Some(hint),
            BuilderError::Engine { .. } => Some(hints::engine()),
            BuilderError::Relocation { .. } => Some(hints::relocation()),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        if let BuilderError::Relocation { source, .. } = self {
            eprintln!("  caused by: {}", source);
        }
        if let BuilderError::Engine { source: Some(source), .. } = self {
            eprintln!("  caused by: {:#}", source);
        }
        if let BuilderError::MissingTool { required_for, .. } = self {
            eprintln!("  required for: {}", required_for);
        }

        if let Some(h) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
        }

        eprintln!();
    }
}

/// Print any error that escaped the pipeline, with hints when it is ours
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<BuilderError>() {
        Some(builder_err) => builder_err.display_with_hints(),
        None => {
            eprintln!("\n{} {:#}", console::style("ERROR:").red().bold(), err);
            eprintln!();
        }
    }
}

/// Common error hints
pub mod hints {
    /// Hint for a missing build engine
    pub fn engine() -> &'static str {
        "Point the builder at the Unity editor executable:\n\
         • Set UNITY_BUILDER_ENGINE=/path/to/Unity\n\
         • Or add to unity-builder.toml in the project:\n\
         \n\
         [engine]\n\
         program = \"/path/to/Unity\""
    }

    /// Hint for an unreadable unity-builder.toml
    pub fn invalid_builder_toml() -> &'static str {
        "unity-builder.toml is invalid. Common issues:\n\
         • Invalid TOML syntax (check quotes, brackets, commas)\n\
         • [engine] args must be an array of strings"
    }

    /// Hint for a failed relocation step
    pub fn relocation() -> &'static str {
        "Relocation is not transactional. Check the output directory and its\n\
         sibling `temp` directory; a previous interrupted run may have left\n\
         one of them behind."
    }

    /// Hint for an Xcode project that does not look like a Unity export
    pub fn unity_xcode_project() -> &'static str {
        "Expected an Xcode project exported by Unity with the targets\n\
         `Unity-iPhone` and `UnityFramework` and a `Data` folder reference."
    }

    /// Hint for a malformed version code
    pub fn version_code() -> &'static str {
        "-androidVersionCode must be a positive integer, e.g. -androidVersionCode 42"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocation_error_message() {
        let err = BuilderError::relocation(
            "move",
            "/out/build",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed to move /out/build");
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_invalid_option_message() {
        let err = BuilderError::invalid_option("androidVersionCode", "not a number", hints::version_code());
        assert_eq!(err.to_string(), "Invalid argument -androidVersionCode: not a number");
        assert_eq!(err.hint(), Some(hints::version_code()));
    }
}

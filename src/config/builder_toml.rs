//! unity-builder.toml configuration parsing
//!
//! The file is optional and lives at the root of the Unity project:
//!
//! ```toml
//! [engine]
//! program = "/Applications/Unity/Hub/Editor/2022.3.20f1/Unity.app/Contents/MacOS/Unity"
//! args = ["-batchmode", "-quit", "-executeMethod", "UnityBuilderAction.Headless.Build"]
//!
//! [scenes]
//! settings = "ProjectSettings/EditorBuildSettings.asset"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::error::{hints, BuilderError};

/// File name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "unity-builder.toml";

/// Environment variable overriding `[engine] program`
pub const ENGINE_ENV_VAR: &str = "UNITY_BUILDER_ENGINE";

/// Engine program used when nothing else is configured
pub const DEFAULT_ENGINE_PROGRAM: &str = "Unity";

/// Scene list read when `[scenes] settings` is not set
pub const DEFAULT_SCENE_SETTINGS: &str = "ProjectSettings/EditorBuildSettings.asset";

/// Root configuration from unity-builder.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub scenes: ScenesConfig,
}

/// How to launch the build engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Executable path or a name resolved through PATH
    #[serde(default = "default_engine_program")]
    pub program: String,

    /// Arguments placed before the request/summary flags
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            args: Vec::new(),
        }
    }
}

fn default_engine_program() -> String {
    DEFAULT_ENGINE_PROGRAM.to_string()
}

/// Where the enabled scene list comes from
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenesConfig {
    /// Path relative to the project root
    #[serde(default = "default_scene_settings")]
    pub settings: PathBuf,
}

impl Default for ScenesConfig {
    fn default() -> Self {
        Self {
            settings: default_scene_settings(),
        }
    }
}

fn default_scene_settings() -> PathBuf {
    PathBuf::from(DEFAULT_SCENE_SETTINGS)
}

impl BuilderConfig {
    /// Load the configuration for a project, falling back to defaults
    ///
    /// `UNITY_BUILDER_ENGINE` wins over the file.
    pub fn load(project_path: &Path) -> Result<Self> {
        let path = project_path.join(CONFIG_FILE_NAME);
        let mut config = if path.is_file() {
            Self::load_from_path(&path)?
        } else {
            Self::default()
        };

        if let Ok(program) = std::env::var(ENGINE_ENV_VAR) {
            if !program.trim().is_empty() {
                config.engine.program = program;
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuilderError::config_error_with_hint(
                format!("Failed to read {}", path.display()),
                Some(e.into()),
                hints::invalid_builder_toml(),
            )
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            BuilderError::config_error_with_hint(
                format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e),
                None,
                hints::invalid_builder_toml(),
            )
        })?;

        if config.engine.program.trim().is_empty() {
            return Err(BuilderError::config_error("[engine] program cannot be empty").into());
        }

        Ok(config)
    }

    /// Absolute path of the scene list for `project_path`
    pub fn scene_settings_path(&self, project_path: &Path) -> PathBuf {
        project_path.join(&self.scenes.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full() {
        let config = BuilderConfig::parse(
            r#"
[engine]
program = "/opt/unity/Editor/Unity"
args = ["-batchmode", "-quit"]

[scenes]
settings = "Config/Scenes.asset"
"#,
        )
        .unwrap();
        assert_eq!(config.engine.program, "/opt/unity/Editor/Unity");
        assert_eq!(config.engine.args, vec!["-batchmode", "-quit"]);
        assert_eq!(config.scenes.settings, PathBuf::from("Config/Scenes.asset"));
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = BuilderConfig::parse("").unwrap();
        assert_eq!(config, BuilderConfig::default());
        assert_eq!(config.engine.program, "Unity");
        assert_eq!(
            config.scene_settings_path(Path::new("/p")),
            PathBuf::from("/p/ProjectSettings/EditorBuildSettings.asset")
        );
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(BuilderConfig::parse("[engine]\nprogramm = \"Unity\"\n").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_program() {
        assert!(BuilderConfig::parse("[engine]\nprogram = \"  \"\n").is_err());
    }

    #[test]
    #[serial]
    fn test_load_without_file() {
        std::env::remove_var(ENGINE_ENV_VAR);
        let temp_dir = TempDir::new().unwrap();
        let config = BuilderConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, BuilderConfig::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[engine]\nprogram = \"/from/file\"\nargs = [\"-batchmode\"]\n",
        )
        .unwrap();

        std::env::remove_var(ENGINE_ENV_VAR);
        let config = BuilderConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.engine.program, "/from/file");

        std::env::set_var(ENGINE_ENV_VAR, "/from/env");
        let config = BuilderConfig::load(temp_dir.path()).unwrap();
        std::env::remove_var(ENGINE_ENV_VAR);
        assert_eq!(config.engine.program, "/from/env");
        assert_eq!(config.engine.args, vec!["-batchmode"]);
    }
}

//! Build profile resolution
//!
//! Turns validated options into the settings handed to the engine. The
//! engine-wide settings Unity keeps in `PlayerSettings` live in
//! [`EngineSettings`] so that nothing here touches global state.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, Serializer};

use super::BuildTarget;
use crate::error::{hints, BuilderError};
use crate::options::{
    ValidatedOptions, FLAG_BUILD_VERSION, FLAG_KEYALIAS_NAME, FLAG_KEYALIAS_PASS, FLAG_KEYSTORE_NAME,
    FLAG_KEYSTORE_PASS, FLAG_VERSION_CODE, HIDDEN_VALUE,
};

/// Output extension that switches Android to an app bundle
pub const APP_BUNDLE_EXTENSION: &str = ".aab";

/// A credential that must not show up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(HIDDEN_VALUE)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(HIDDEN_VALUE)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

/// Unity `BuildOptions` flags passed with the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildOption {
    AcceptExternalModificationsToPlayer,
    Development,
    AllowDebugging,
}

/// Scripting backend override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptingBackend {
    Mono2x,
}

/// Android keystore settings, each applied only when provided
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AndroidSigning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keystore_pass: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyalias_name: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyalias_pass: Option<Secret>,
}

/// Engine-wide configuration applied before the build call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macos_build_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_version_code: Option<u32>,
    pub build_app_bundle: bool,
    pub export_as_google_android_project: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripting_backend: Option<ScriptingBackend>,
    pub android_signing: AndroidSigning,
}

/// Everything the engine needs for one build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildProfile {
    pub target: BuildTarget,
    pub project_path: PathBuf,
    /// Location the engine writes the player to
    pub output_path: String,
    pub build_name: String,
    pub options: Vec<BuildOption>,
    pub settings: EngineSettings,
}

/// Resolve the profile for the validated target
pub fn resolve_profile(validated: &ValidatedOptions) -> Result<BuildProfile> {
    let options = &validated.options;

    let mut settings = EngineSettings {
        bundle_version: options.non_empty(FLAG_BUILD_VERSION).map(str::to_string),
        macos_build_number: options.non_empty(FLAG_BUILD_VERSION).map(str::to_string),
        android_version_code: parse_version_code(options.non_empty(FLAG_VERSION_CODE))?,
        ..EngineSettings::default()
    };
    let mut build_options = Vec::new();

    match validated.target {
        BuildTarget::Android => {
            settings.build_app_bundle = validated.output_path.ends_with(APP_BUNDLE_EXTENSION);
            settings.export_as_google_android_project = true;
            settings.android_signing = AndroidSigning {
                keystore_name: options.non_empty(FLAG_KEYSTORE_NAME).map(str::to_string),
                keystore_pass: options.non_empty(FLAG_KEYSTORE_PASS).map(Secret::new),
                keyalias_name: options.non_empty(FLAG_KEYALIAS_NAME).map(Secret::new),
                keyalias_pass: options.non_empty(FLAG_KEYALIAS_PASS).map(Secret::new),
            };
            build_options = vec![
                BuildOption::AcceptExternalModificationsToPlayer,
                BuildOption::Development,
                BuildOption::AllowDebugging,
            ];
        }
        BuildTarget::StandaloneOSX => {
            settings.scripting_backend = Some(ScriptingBackend::Mono2x);
        }
        BuildTarget::StandaloneWindows
        | BuildTarget::StandaloneWindows64
        | BuildTarget::StandaloneLinux64
        | BuildTarget::Ios
        | BuildTarget::WebGL
        | BuildTarget::WSAPlayer
        | BuildTarget::TvOS
        | BuildTarget::PS4
        | BuildTarget::PS5
        | BuildTarget::XboxOne
        | BuildTarget::Switch
        | BuildTarget::GameCoreXboxSeries
        | BuildTarget::GameCoreXboxOne
        | BuildTarget::EmbeddedLinux
        | BuildTarget::Lumin
        | BuildTarget::Stadia
        | BuildTarget::CloudRendering
        | BuildTarget::LinuxHeadlessSimulation
        | BuildTarget::QNX
        | BuildTarget::VisionOS
        | BuildTarget::NoTarget => {}
    }

    Ok(BuildProfile {
        target: validated.target,
        project_path: validated.project_path.clone(),
        output_path: validated.output_path.clone(),
        build_name: validated.build_name.clone(),
        options: build_options,
        settings,
    })
}

fn parse_version_code(value: Option<&str>) -> Result<Option<u32>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse::<u32>() {
        Ok(code) if code > 0 => Ok(Some(code)),
        _ => Err(BuilderError::invalid_option(
            FLAG_VERSION_CODE,
            format!("'{}' is not a positive integer", value),
            hints::version_code(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::validation::DEFAULT_BUILD_NAME;
    use crate::options::OptionSet;

    fn validated(target: BuildTarget, output: &str, extra: &[(&str, &str)]) -> ValidatedOptions {
        let mut options = OptionSet::new();
        for (k, v) in extra {
            options.insert(*k, *v);
        }
        ValidatedOptions {
            options,
            project_path: PathBuf::from("/p"),
            target,
            output_path: output.to_string(),
            build_name: DEFAULT_BUILD_NAME.to_string(),
        }
    }

    #[test]
    fn test_android_app_bundle_from_extension() {
        let profile = resolve_profile(&validated(BuildTarget::Android, "/out/app.aab", &[])).unwrap();
        assert!(profile.settings.build_app_bundle);
        assert!(profile.settings.export_as_google_android_project);
        assert_eq!(profile.options.len(), 3);

        let profile = resolve_profile(&validated(BuildTarget::Android, "/out/build/Android/Android.apk", &[])).unwrap();
        assert!(!profile.settings.build_app_bundle);
    }

    #[test]
    fn test_android_signing_only_when_non_empty() {
        let profile = resolve_profile(&validated(
            BuildTarget::Android,
            "/out/app.apk",
            &[
                ("androidKeystoreName", "user.keystore"),
                ("androidKeystorePass", ""),
                ("androidKeyaliasName", "alias"),
            ],
        ))
        .unwrap();
        let signing = &profile.settings.android_signing;
        assert_eq!(signing.keystore_name.as_deref(), Some("user.keystore"));
        assert!(signing.keystore_pass.is_none());
        assert_eq!(signing.keyalias_name, Some(Secret::new("alias")));
        assert!(signing.keyalias_pass.is_none());
    }

    #[test]
    fn test_signing_ignored_for_other_targets() {
        let profile = resolve_profile(&validated(
            BuildTarget::Ios,
            "/out/build/iOS/iOS",
            &[("androidKeystoreName", "user.keystore")],
        ))
        .unwrap();
        assert_eq!(profile.settings.android_signing, AndroidSigning::default());
        assert!(profile.options.is_empty());
    }

    #[test]
    fn test_macos_forces_mono() {
        let profile = resolve_profile(&validated(BuildTarget::StandaloneOSX, "/out/Game.app", &[])).unwrap();
        assert_eq!(profile.settings.scripting_backend, Some(ScriptingBackend::Mono2x));
    }

    #[test]
    fn test_other_targets_identity() {
        let profile = resolve_profile(&validated(BuildTarget::WebGL, "/out/web", &[])).unwrap();
        assert_eq!(profile.settings, EngineSettings::default());
        assert_eq!(profile.output_path, "/out/web");
        assert_eq!(profile.build_name, "TestBuild");
    }

    #[test]
    fn test_versions_applied() {
        let profile = resolve_profile(&validated(
            BuildTarget::Android,
            "/out/app.aab",
            &[("buildVersion", "1.2.3"), ("androidVersionCode", "7")],
        ))
        .unwrap();
        assert_eq!(profile.settings.bundle_version.as_deref(), Some("1.2.3"));
        assert_eq!(profile.settings.macos_build_number.as_deref(), Some("1.2.3"));
        assert_eq!(profile.settings.android_version_code, Some(7));
    }

    #[test]
    fn test_invalid_version_code() {
        for bad in ["seven", "-1", "0", "1.5"] {
            let result = resolve_profile(&validated(BuildTarget::Android, "/out/app.aab", &[("androidVersionCode", bad)]));
            assert!(result.is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn test_secrets_hidden_in_debug() {
        let profile = resolve_profile(&validated(
            BuildTarget::Android,
            "/out/app.aab",
            &[("androidKeystorePass", "hunter2"), ("androidKeyaliasPass", "swordfish")],
        ))
        .unwrap();
        let debug = format!("{:?}", profile);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("swordfish"));
        assert!(debug.contains("*HIDDEN*"));

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("hunter2"));
    }
}

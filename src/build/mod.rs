//! Build orchestration
//!
//! ```text
//! options → profile.rs → engine.rs (Unity) → platforms/<target>.rs → report.rs
//! ```
//!
//! ## Modules
//!
//! - `profile` - Target-specific engine settings resolved from the options
//! - `engine` - The external build engine and its request/summary protocol
//! - `scenes` - Enabled scene list read from the Unity project
//! - `platforms` - Post-build steps per target (relocation, Xcode patching)
//! - `relocate` - The move-temp / delete-stale / move-final sequence
//! - `report` - Summary output and exit codes

pub mod engine;
pub mod platforms;
pub mod profile;
pub mod relocate;
pub mod report;
pub mod scenes;
pub mod xcode;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use profile::BuildProfile;

/// Platforms the engine can build for
///
/// Names match Unity's `BuildTarget` enum exactly, including case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildTarget {
    StandaloneOSX,
    StandaloneWindows,
    StandaloneWindows64,
    StandaloneLinux64,
    #[serde(rename = "iOS")]
    Ios,
    Android,
    WebGL,
    WSAPlayer,
    #[serde(rename = "tvOS")]
    TvOS,
    PS4,
    PS5,
    XboxOne,
    Switch,
    GameCoreXboxSeries,
    GameCoreXboxOne,
    EmbeddedLinux,
    Lumin,
    Stadia,
    CloudRendering,
    LinuxHeadlessSimulation,
    QNX,
    VisionOS,
    NoTarget,
}

impl BuildTarget {
    pub const ALL: &'static [BuildTarget] = &[
        BuildTarget::StandaloneOSX,
        BuildTarget::StandaloneWindows,
        BuildTarget::StandaloneWindows64,
        BuildTarget::StandaloneLinux64,
        BuildTarget::Ios,
        BuildTarget::Android,
        BuildTarget::WebGL,
        BuildTarget::WSAPlayer,
        BuildTarget::TvOS,
        BuildTarget::PS4,
        BuildTarget::PS5,
        BuildTarget::XboxOne,
        BuildTarget::Switch,
        BuildTarget::GameCoreXboxSeries,
        BuildTarget::GameCoreXboxOne,
        BuildTarget::EmbeddedLinux,
        BuildTarget::Lumin,
        BuildTarget::Stadia,
        BuildTarget::CloudRendering,
        BuildTarget::LinuxHeadlessSimulation,
        BuildTarget::QNX,
        BuildTarget::VisionOS,
        BuildTarget::NoTarget,
    ];

    /// Name as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            BuildTarget::StandaloneOSX => "StandaloneOSX",
            BuildTarget::StandaloneWindows => "StandaloneWindows",
            BuildTarget::StandaloneWindows64 => "StandaloneWindows64",
            BuildTarget::StandaloneLinux64 => "StandaloneLinux64",
            BuildTarget::Ios => "iOS",
            BuildTarget::Android => "Android",
            BuildTarget::WebGL => "WebGL",
            BuildTarget::WSAPlayer => "WSAPlayer",
            BuildTarget::TvOS => "tvOS",
            BuildTarget::PS4 => "PS4",
            BuildTarget::PS5 => "PS5",
            BuildTarget::XboxOne => "XboxOne",
            BuildTarget::Switch => "Switch",
            BuildTarget::GameCoreXboxSeries => "GameCoreXboxSeries",
            BuildTarget::GameCoreXboxOne => "GameCoreXboxOne",
            BuildTarget::EmbeddedLinux => "EmbeddedLinux",
            BuildTarget::Lumin => "Lumin",
            BuildTarget::Stadia => "Stadia",
            BuildTarget::CloudRendering => "CloudRendering",
            BuildTarget::LinuxHeadlessSimulation => "LinuxHeadlessSimulation",
            BuildTarget::QNX => "QNX",
            BuildTarget::VisionOS => "VisionOS",
            BuildTarget::NoTarget => "NoTarget",
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a target name is not one of [`BuildTarget::ALL`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown build target '{}'", self.0)
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for BuildTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildTarget::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}

/// Outcome reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildResult {
    Succeeded,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Summary returned by the engine after a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Wall-clock build time
    #[serde(rename = "total_time_ms", with = "duration_millis")]
    pub total_time: Duration,
    pub total_warnings: u32,
    pub total_errors: u32,
    /// Output size in bytes
    pub total_size: u64,
    pub result: BuildResult,
}

impl BuildSummary {
    /// Summary used when the engine could not produce one
    pub fn failed(total_time: Duration) -> Self {
        Self {
            total_time,
            total_warnings: 0,
            total_errors: 1,
            total_size: 0,
            result: BuildResult::Failed,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// The external engine that performs the actual player build
pub trait BuildEngine {
    /// Run one blocking build of `scenes` with `profile`
    fn build(&mut self, profile: &BuildProfile, scenes: &[String]) -> Result<BuildSummary>;
}

//! Target-specific steps around the engine build
//!
//! Each target gets a [`Platform`] from [`get_platform`]. Most targets need
//! nothing beyond the engine build; Android and iOS export projects into a
//! fixed subpath that is relocated afterwards, and the iOS export also has
//! its Xcode project patched.

pub mod android;
pub mod ios;

use anyhow::Result;

use super::{BuildProfile, BuildTarget};

/// Steps a target runs before and after the engine build
pub trait Platform {
    /// Get the platform name
    fn platform_name(&self) -> &str;

    /// Prepare the output location before the engine runs
    fn prepare(&self, _profile: &BuildProfile) -> Result<()> {
        Ok(())
    }

    /// Post-process a successful build
    fn post_build(&self, _profile: &BuildProfile) -> Result<()> {
        Ok(())
    }
}

/// Targets whose output is used exactly as the engine leaves it
pub struct StandardPlatform {
    target: BuildTarget,
}

impl Platform for StandardPlatform {
    fn platform_name(&self) -> &str {
        self.target.name()
    }
}

/// Get the platform steps for the target
pub fn get_platform(target: BuildTarget) -> Box<dyn Platform> {
    match target {
        BuildTarget::Android => Box::new(android::AndroidPlatform),
        BuildTarget::Ios => Box::new(ios::IosPlatform),
        BuildTarget::StandaloneOSX
        | BuildTarget::StandaloneWindows
        | BuildTarget::StandaloneWindows64
        | BuildTarget::StandaloneLinux64
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
        | BuildTarget::NoTarget => Box::new(StandardPlatform { target }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_target_has_platform() {
        for target in BuildTarget::ALL {
            assert_eq!(get_platform(*target).platform_name(), target.name());
        }
    }
}

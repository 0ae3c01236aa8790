//! Android post-build steps

use std::path::Path;

use anyhow::Result;

use super::Platform;
use crate::build::relocate::{relocate, RelocationPlan};
use crate::build::BuildProfile;
use crate::utils::paths::ensure_dir;
use crate::utils::terminal::print_warning;

/// Subpath the engine exports the Gradle project into
pub const ANDROID_OUTPUT_FRAGMENT: &str = "/build/Android/Android.apk";

/// Android target steps
pub struct AndroidPlatform;

impl Platform for AndroidPlatform {
    fn platform_name(&self) -> &str {
        "Android"
    }

    fn prepare(&self, profile: &BuildProfile) -> Result<()> {
        if profile.settings.export_as_google_android_project {
            ensure_dir(Path::new(&profile.output_path))?;
        }
        Ok(())
    }

    fn post_build(&self, profile: &BuildProfile) -> Result<()> {
        relocate_export(&profile.output_path, ANDROID_OUTPUT_FRAGMENT)
    }
}

/// Relocate an exported project, or warn when it already sits in place
pub(super) fn relocate_export(output_path: &str, fragment: &str) -> Result<()> {
    match RelocationPlan::from_fragment(output_path, fragment) {
        Some(plan) => relocate(&plan),
        None => {
            print_warning(&format!(
                "Output path {} does not contain {}, skipping relocation",
                output_path, fragment
            ));
            Ok(())
        }
    }
}

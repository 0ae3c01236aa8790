//! Path utilities for build output

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Xcode project inside a Unity iOS export
pub const XCODE_PROJECT_DIR: &str = "Unity-iPhone.xcodeproj";

/// Project file inside [`XCODE_PROJECT_DIR`]
pub const PBXPROJ_FILE: &str = "project.pbxproj";

/// Path of the generated Xcode project file for an iOS output directory
pub fn xcode_project_file(output_dir: &Path) -> PathBuf {
    output_dir.join(XCODE_PROJECT_DIR).join(PBXPROJ_FILE)
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Replace every occurrence of `fragment` in a path string
///
/// Returns `None` when the fragment does not occur.
pub fn replace_fragment(path: &str, fragment: &str, replacement: &str) -> Option<PathBuf> {
    if fragment.is_empty() || !path.contains(fragment) {
        return None;
    }
    Some(PathBuf::from(path.replace(fragment, replacement)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_xcode_project_file() {
        assert_eq!(
            xcode_project_file(Path::new("/out/build/iOS/iOS")),
            PathBuf::from("/out/build/iOS/iOS/Unity-iPhone.xcodeproj/project.pbxproj")
        );
    }

    #[test]
    fn test_replace_fragment() {
        assert_eq!(
            replace_fragment("/ci/app/build/Android/Android.apk", "/build/Android/Android.apk", "/temp"),
            Some(PathBuf::from("/ci/app/temp"))
        );
        assert_eq!(replace_fragment("/out/app.aab", "/build/Android/Android.apk", "/temp"), None);
    }

    #[test]
    fn test_ensure_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}

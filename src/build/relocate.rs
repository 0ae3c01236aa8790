//! Replacement of previous build output
//!
//! The engine writes into a fixed subpath below the output root, while the
//! automation expects the result at the root's `build` directory. The fresh
//! tree is moved aside to a sibling `temp` directory, the stale `build`
//! directory (which may contain the fresh tree's old location) is deleted,
//! and the fresh tree is moved into place.
//!
//! The three steps are not transactional. A crash between them leaves
//! `temp` behind with `build` missing or stale, and the next run fails on
//! step 1 until someone clears `temp`. There is no recovery logic.

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::error::BuilderError;
use crate::utils::paths::replace_fragment;
use crate::utils::terminal::print_info;

/// Locations involved in one relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    /// Where the engine left the fresh output
    pub build_output: PathBuf,
    /// Sibling directory the fresh output passes through
    pub temp: PathBuf,
    /// Where the fresh output ends up
    pub destination: PathBuf,
}

impl RelocationPlan {
    /// Derive the plan from an engine output path and the target's fragment
    ///
    /// Returns `None` when `output_path` does not contain `fragment`; the
    /// output then already is where it belongs.
    pub fn from_fragment(output_path: &str, fragment: &str) -> Option<Self> {
        let temp = replace_fragment(output_path, fragment, "/temp")?;
        let destination = replace_fragment(output_path, fragment, "/build")?;
        Some(Self {
            build_output: PathBuf::from(output_path),
            temp,
            destination,
        })
    }
}

/// Move the fresh output to its destination, replacing stale output
///
/// Order: fresh → temp, delete stale destination, temp → destination.
/// Any failure aborts immediately.
pub fn relocate(plan: &RelocationPlan) -> Result<()> {
    print_info(&format!(
        "Orig path: {} || temp path: {}",
        plan.build_output.display(),
        plan.temp.display()
    ));
    move_dir(&plan.build_output, &plan.temp)?;

    if plan.destination.exists() {
        print_info(&format!("Deleting build folder: {}", plan.destination.display()));
        std::fs::remove_dir_all(&plan.destination)
            .map_err(|e| BuilderError::relocation("delete", &plan.destination, e))?;
    }

    print_info(&format!(
        "From: {} || to: {}",
        plan.temp.display(),
        plan.destination.display()
    ));
    move_dir(&plan.temp, &plan.destination)?;

    let (files, bytes) = tree_size(&plan.destination);
    print_info(&format!("Relocated {} files ({} bytes)", files, bytes));
    Ok(())
}

fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(BuilderError::relocation(
            "move",
            from,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("destination {} already exists", to.display()),
            ),
        )
        .into());
    }
    std::fs::rename(from, to).map_err(|e| BuilderError::relocation("move", from, e))?;
    Ok(())
}

fn tree_size(root: &Path) -> (usize, u64) {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .fold((0, 0), |(files, bytes), entry| {
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (files + 1, bytes + len)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ANDROID_FRAGMENT: &str = "/build/Android/Android.apk";

    fn files_under(root: &Path) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        files.sort();
        files
    }

    fn android_plan(root: &Path) -> RelocationPlan {
        let output = format!("{}{}", root.display(), ANDROID_FRAGMENT);
        RelocationPlan::from_fragment(&output, ANDROID_FRAGMENT).unwrap()
    }

    #[test]
    fn test_plan_from_fragment() {
        let plan = RelocationPlan::from_fragment("/ci/out/build/iOS/iOS", "/build/iOS/iOS").unwrap();
        assert_eq!(plan.build_output, PathBuf::from("/ci/out/build/iOS/iOS"));
        assert_eq!(plan.temp, PathBuf::from("/ci/out/temp"));
        assert_eq!(plan.destination, PathBuf::from("/ci/out/build"));
    }

    #[test]
    fn test_plan_without_fragment() {
        assert_eq!(RelocationPlan::from_fragment("/out/app.aab", ANDROID_FRAGMENT), None);
    }

    #[test]
    fn test_relocate_replaces_stale_output() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let plan = android_plan(root);

        // Stale output from an earlier run next to the fresh export
        fs::create_dir_all(root.join("build/old")).unwrap();
        fs::write(root.join("build/old/stale.txt"), "stale").unwrap();
        fs::write(root.join("build/leftover.txt"), "stale").unwrap();

        fs::create_dir_all(plan.build_output.join("launcher/src")).unwrap();
        fs::write(plan.build_output.join("build.gradle"), "fresh").unwrap();
        fs::write(plan.build_output.join("launcher/src/Main.java"), "fresh").unwrap();

        relocate(&plan).unwrap();

        assert!(!plan.build_output.exists());
        assert!(!plan.temp.exists());
        assert_eq!(files_under(&plan.destination), vec!["build.gradle", "launcher/src/Main.java"]);
        assert_eq!(fs::read_to_string(plan.destination.join("build.gradle")).unwrap(), "fresh");
    }

    #[test]
    fn test_relocate_without_stale_output() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let plan = RelocationPlan {
            build_output: root.join("engine-out"),
            temp: root.join("temp"),
            destination: root.join("build"),
        };
        fs::create_dir_all(&plan.build_output).unwrap();
        fs::write(plan.build_output.join("Info.plist"), "fresh").unwrap();

        relocate(&plan).unwrap();

        assert!(!plan.build_output.exists());
        assert!(!plan.temp.exists());
        assert_eq!(files_under(&plan.destination), vec!["Info.plist"]);
    }

    #[test]
    fn test_relocate_missing_output_fails() {
        let temp_dir = TempDir::new().unwrap();
        let plan = android_plan(temp_dir.path());
        fs::create_dir_all(temp_dir.path().join("build")).unwrap();

        let err = relocate(&plan).unwrap_err();
        assert!(err.downcast_ref::<BuilderError>().is_some());
        // Stale output is untouched when the first move fails
        assert!(temp_dir.path().join("build").exists());
    }

    #[test]
    fn test_relocate_leftover_temp_fails() {
        let temp_dir = TempDir::new().unwrap();
        let plan = android_plan(temp_dir.path());
        fs::create_dir_all(&plan.build_output).unwrap();
        fs::create_dir_all(plan.temp.join("previous")).unwrap();

        assert!(relocate(&plan).is_err());
        assert!(plan.build_output.exists());
    }
}

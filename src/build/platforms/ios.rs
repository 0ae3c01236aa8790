//! iOS post-build steps
//!
//! Unity exports an Xcode project whose app target embeds `UnityFramework`.
//! For the framework to be hosted by another app, its resources phase must
//! carry the `Data` folder, bitcode must be off and the plugin callback
//! symbol must be allowed to stay undefined at link time.

use std::path::Path;

use anyhow::{Context, Result};

use super::android::relocate_export;
use super::Platform;
use crate::build::xcode::PbxProject;
use crate::build::BuildProfile;
use crate::error::{hints, BuilderError};
use crate::utils::paths::xcode_project_file;
use crate::utils::terminal::print_info;

/// Subpath the engine exports the Xcode project into
pub const IOS_OUTPUT_FRAGMENT: &str = "/build/iOS/iOS";

/// Linker flag that lets the host app provide the plugin callback
pub const FLUTTER_LINKER_FLAG: &str = "-Wl,-U,_FlutterUnityPluginOnMessage";

/// Folder reference holding the player data
pub const DATA_RESOURCE: &str = "Data";

/// iOS target steps
pub struct IosPlatform;

impl Platform for IosPlatform {
    fn platform_name(&self) -> &str {
        "iOS"
    }

    fn post_build(&self, profile: &BuildProfile) -> Result<()> {
        patch_xcode_project(&xcode_project_file(Path::new(&profile.output_path)))?;
        relocate_export(&profile.output_path, IOS_OUTPUT_FRAGMENT)
    }
}

/// Patch the exported `project.pbxproj` in place
pub fn patch_xcode_project(path: &Path) -> Result<()> {
    print_info(&format!("Patching {}", path.display()));

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut project = PbxProject::parse(&source)
        .map_err(|e| BuilderError::project_file_with_hint(path, format!("{:#}", e), hints::unity_xcode_project()))?;

    patch_project(&mut project)
        .map_err(|e| BuilderError::project_file_with_hint(path, format!("{:#}", e), hints::unity_xcode_project()))?;

    std::fs::write(path, project.write_to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn patch_project(project: &mut PbxProject) -> Result<()> {
    let main = project
        .unity_main_target()
        .context("Unity-iPhone target not found")?;
    project.set_build_property(&main, "ENABLE_BITCODE", "NO")?;
    project.add_build_property(&main, "OTHER_LDFLAGS", FLUTTER_LINKER_FLAG)?;

    let data = project
        .find_resource_file_ref(DATA_RESOURCE)
        .context("Data resource not found")?;
    let framework = project
        .unity_framework_target()
        .context("UnityFramework target not found")?;
    let phase = project
        .resources_build_phase(&framework)
        .context("UnityFramework has no resources build phase")?;
    let build_file = project.add_file_to_build_phase(&framework, &phase, &data)?;
    print_info(&format!("Registered {} in UnityFramework resources as {}", DATA_RESOURCE, build_file));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::xcode::plist::Value;
    use crate::build::xcode::project::tests::UNITY_PROJECT;
    use std::fs;
    use tempfile::TempDir;

    fn write_export(root: &Path) -> std::path::PathBuf {
        let file = xcode_project_file(root);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, UNITY_PROJECT).unwrap();
        file
    }

    #[test]
    fn test_patch_registers_data_in_framework() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_export(temp_dir.path());

        patch_xcode_project(&file).unwrap();

        let project = PbxProject::parse(&fs::read_to_string(&file).unwrap()).unwrap();
        let framework = project.unity_framework_target().unwrap();
        let phase = project.resources_build_phase(&framework).unwrap();
        let files = project.object(&phase).unwrap().get("files").unwrap().as_array().unwrap();
        assert_eq!(files.len(), 1);
        let build_file = project.object(files[0].as_str().unwrap()).unwrap();
        assert_eq!(build_file.get_str("fileRef"), Some("AA5C1491174E662D0006EB36"));

        assert_eq!(
            project.build_setting("1D6058950D05DD3E006BFB54", "ENABLE_BITCODE"),
            Some(&Value::from("NO"))
        );
        let flags = project.build_setting("1D6058940D05DD3E006BFB54", "OTHER_LDFLAGS").unwrap();
        assert!(flags.as_array().unwrap().contains(&Value::from(FLUTTER_LINKER_FLAG)));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = write_export(temp_dir.path());

        patch_xcode_project(&file).unwrap();
        let once = fs::read_to_string(&file).unwrap();
        patch_xcode_project(&file).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), once);
    }

    #[test]
    fn test_patch_rejects_non_unity_project() {
        let temp_dir = TempDir::new().unwrap();
        let file = xcode_project_file(temp_dir.path());
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "// !$*UTF8*$!\n{\n\tobjects = {\n\t};\n}\n").unwrap();

        let err = patch_xcode_project(&file).unwrap_err();
        let err = err.downcast_ref::<BuilderError>().unwrap();
        assert!(matches!(err, BuilderError::ProjectFile { .. }));
        assert_eq!(err.hint(), Some(hints::unity_xcode_project()));
    }

    #[test]
    fn test_missing_project_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(patch_xcode_project(&xcode_project_file(temp_dir.path())).is_err());
    }

    #[test]
    fn test_post_build_patches_then_relocates() {
        let temp_dir = TempDir::new().unwrap();
        let output = format!("{}{}", temp_dir.path().display(), IOS_OUTPUT_FRAGMENT);
        write_export(Path::new(&output));
        fs::create_dir_all(temp_dir.path().join("build/stale")).unwrap();

        let profile = BuildProfile {
            target: crate::build::BuildTarget::Ios,
            project_path: "/project".into(),
            output_path: output,
            build_name: "TestBuild".to_string(),
            options: Vec::new(),
            settings: Default::default(),
        };
        IosPlatform.post_build(&profile).unwrap();

        let relocated = xcode_project_file(&temp_dir.path().join("build"));
        assert!(fs::read_to_string(relocated).unwrap().contains(FLUTTER_LINKER_FLAG));
        assert!(!temp_dir.path().join("build/stale").exists());
    }
}

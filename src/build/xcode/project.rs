//! Xcode project model on top of the parsed `project.pbxproj`
//!
//! Only the operations the Unity export needs are provided: target lookup,
//! build settings, file reference lookup and build phase registration.

use anyhow::{anyhow, bail, Result};

use super::plist::{self, Dict, Document, Value};

/// Main application target of a Unity iOS export
pub const UNITY_MAIN_TARGET: &str = "Unity-iPhone";

/// Framework target of a Unity iOS export (2019.3+)
pub const UNITY_FRAMEWORK_TARGET: &str = "UnityFramework";

const RESOURCES_PHASE_ISA: &str = "PBXResourcesBuildPhase";

/// A parsed Xcode project
#[derive(Debug, Clone)]
pub struct PbxProject {
    doc: Document,
}

impl PbxProject {
    /// Parse the contents of a `project.pbxproj`
    pub fn parse(source: &str) -> Result<Self> {
        let doc = plist::parse(source).map_err(|e| anyhow!("Failed to parse project: {}", e))?;
        if doc.root.get("objects").and_then(Value::as_dict).is_none() {
            bail!("Project has no objects dictionary");
        }
        Ok(Self { doc })
    }

    /// Serialize back to `project.pbxproj` text
    pub fn write_to_string(&self) -> String {
        plist::write(&self.doc)
    }

    fn objects(&self) -> &Dict {
        // Checked in parse; nothing replaces the objects dictionary
        self.doc
            .root
            .get("objects")
            .and_then(Value::as_dict)
            .unwrap_or(&EMPTY)
    }

    fn objects_mut(&mut self) -> Result<&mut Dict> {
        self.doc
            .root
            .get_mut("objects")
            .and_then(Value::as_dict_mut)
            .ok_or_else(|| anyhow!("Project has no objects dictionary"))
    }

    /// Object dictionary for `id`
    pub fn object(&self, id: &str) -> Option<&Dict> {
        self.objects().get(id).and_then(Value::as_dict)
    }

    fn objects_with_isa<'a>(&'a self, isa: &'a str) -> impl Iterator<Item = (&'a str, &'a Dict)> + 'a {
        self.objects()
            .iter()
            .filter_map(|(id, v)| v.as_dict().map(|d| (id, d)))
            .filter(move |(_, d)| d.get_str("isa") == Some(isa))
    }

    /// Identifier of the native target called `name`
    pub fn target_by_name(&self, name: &str) -> Option<String> {
        self.objects_with_isa("PBXNativeTarget")
            .find(|(_, d)| d.get_str("name") == Some(name))
            .map(|(id, _)| id.to_string())
    }

    /// Identifier of the Unity main app target
    pub fn unity_main_target(&self) -> Option<String> {
        self.target_by_name(UNITY_MAIN_TARGET)
    }

    /// Identifier of the UnityFramework target
    pub fn unity_framework_target(&self) -> Option<String> {
        self.target_by_name(UNITY_FRAMEWORK_TARGET)
    }

    /// Build configuration identifiers of a target (Debug, Release, ...)
    pub fn build_configurations(&self, target: &str) -> Result<Vec<String>> {
        let target_obj = self
            .object(target)
            .ok_or_else(|| anyhow!("Unknown target {}", target))?;
        let list_id = target_obj
            .get_str("buildConfigurationList")
            .ok_or_else(|| anyhow!("Target {} has no build configuration list", target))?;
        let list = self
            .object(list_id)
            .ok_or_else(|| anyhow!("Missing configuration list {}", list_id))?;
        Ok(list
            .get("buildConfigurations")
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    /// Current value of a build setting in one configuration
    #[cfg(test)]
    pub fn build_setting(&self, configuration: &str, key: &str) -> Option<&Value> {
        self.object(configuration)?
            .get("buildSettings")
            .and_then(Value::as_dict)?
            .get(key)
    }

    fn build_settings_mut(&mut self, configuration: &str) -> Result<&mut Dict> {
        let config = self
            .objects_mut()?
            .get_mut(configuration)
            .and_then(Value::as_dict_mut)
            .ok_or_else(|| anyhow!("Missing build configuration {}", configuration))?;
        if !config.contains_key("buildSettings") {
            config.insert("buildSettings", Value::Dict(Dict::new()));
        }
        config
            .get_mut("buildSettings")
            .and_then(Value::as_dict_mut)
            .ok_or_else(|| anyhow!("buildSettings of {} is not a dictionary", configuration))
    }

    /// Set a build setting on every configuration of `target`
    pub fn set_build_property(&mut self, target: &str, key: &str, value: &str) -> Result<()> {
        for configuration in self.build_configurations(target)? {
            self.build_settings_mut(&configuration)?.insert(key, Value::from(value));
        }
        Ok(())
    }

    /// Add a value to a list-like build setting on every configuration
    ///
    /// A missing setting becomes `value`; a different scalar becomes a list
    /// of both; a list gains `value` unless it already holds it.
    pub fn add_build_property(&mut self, target: &str, key: &str, value: &str) -> Result<()> {
        for configuration in self.build_configurations(target)? {
            let settings = self.build_settings_mut(&configuration)?;
            let updated = match settings.get(key) {
                None => Value::from(value),
                Some(Value::String(existing)) if existing == value => continue,
                Some(Value::String(existing)) => {
                    Value::Array(vec![Value::from(existing.as_str()), Value::from(value)])
                }
                Some(Value::Array(items)) => {
                    if items.iter().any(|v| v.as_str() == Some(value)) {
                        continue;
                    }
                    let mut items = items.clone();
                    items.push(Value::from(value));
                    Value::Array(items)
                }
                Some(Value::Dict(_)) => bail!("Build setting {} in {} is a dictionary", key, configuration),
            };
            settings.insert(key, updated);
        }
        Ok(())
    }

    /// Resources build phase of a target
    pub fn resources_build_phase(&self, target: &str) -> Option<String> {
        self.object(target)?
            .get("buildPhases")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(Value::as_str)
            .find(|id| self.object(id).and_then(|d| d.get_str("isa")) == Some(RESOURCES_PHASE_ISA))
            .map(str::to_string)
    }

    /// File reference whose project path or name is `path`
    pub fn find_file_ref_by_path(&self, path: &str) -> Option<String> {
        let path = path.trim_start_matches('/');
        self.objects_with_isa("PBXFileReference")
            .find(|(_, d)| d.get_str("path") == Some(path) || d.get_str("name") == Some(path))
            .map(|(id, _)| id.to_string())
    }

    /// File reference of a resource registered in some resources phase
    ///
    /// Falls back to any file reference with that path.
    pub fn find_resource_file_ref(&self, name: &str) -> Option<String> {
        let by_path = self.find_file_ref_by_path(name);
        let in_resources = self
            .objects_with_isa(RESOURCES_PHASE_ISA)
            .flat_map(|(_, phase)| phase.get("files").and_then(Value::as_array).unwrap_or_default())
            .filter_map(Value::as_str)
            .filter_map(|build_file| self.object(build_file)?.get_str("fileRef"))
            .find(|file_ref| {
                self.object(file_ref).is_some_and(|d| {
                    d.get_str("path") == Some(name) || d.get_str("name") == Some(name)
                })
            })
            .map(str::to_string);
        in_resources.or(by_path)
    }

    /// Register a file reference into a build phase of `target`
    ///
    /// Creates a `PBXBuildFile` for the reference and appends it to the
    /// phase. Returns the build file identifier; when the phase already
    /// builds that reference, the existing identifier is returned unchanged.
    pub fn add_file_to_build_phase(&mut self, target: &str, phase: &str, file_ref: &str) -> Result<String> {
        let phase_obj = self
            .object(phase)
            .ok_or_else(|| anyhow!("Unknown build phase {}", phase))?;
        let owned_by_target = self
            .object(target)
            .and_then(|t| t.get("buildPhases"))
            .and_then(Value::as_array)
            .is_some_and(|phases| phases.iter().any(|p| p.as_str() == Some(phase)));
        if !owned_by_target {
            bail!("Build phase {} does not belong to target {}", phase, target);
        }
        if self.object(file_ref).is_none() {
            bail!("Unknown file reference {}", file_ref);
        }

        let existing = phase_obj
            .get("files")
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .find(|id| self.object(id).and_then(|d| d.get_str("fileRef")) == Some(file_ref))
            .map(str::to_string);
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let build_file_id = self.generate_id(&format!("{}:{}", phase, file_ref));
        let phase_name = self.doc.annotations.get(phase).cloned();
        if let Some(file_name) = self.doc.annotations.get(file_ref).cloned() {
            let annotation = match phase_name {
                Some(phase_name) => format!("{} in {}", file_name, phase_name),
                None => file_name,
            };
            self.doc.annotations.insert(build_file_id.clone(), annotation);
        }

        let mut build_file = Dict::new();
        build_file.insert("isa", Value::from("PBXBuildFile"));
        build_file.insert("fileRef", Value::from(file_ref));

        let objects = self.objects_mut()?;
        objects.insert(build_file_id.clone(), Value::Dict(build_file));

        let phase_obj = objects
            .get_mut(phase)
            .and_then(Value::as_dict_mut)
            .ok_or_else(|| anyhow!("Unknown build phase {}", phase))?;
        match phase_obj.get_mut("files") {
            Some(Value::Array(files)) => files.push(Value::from(build_file_id.as_str())),
            Some(_) => bail!("files of build phase {} is not a list", phase),
            None => phase_obj.insert("files", Value::Array(vec![Value::from(build_file_id.as_str())])),
        }

        Ok(build_file_id)
    }

    /// A new 24-digit identifier derived from `seed`, unique in the project
    fn generate_id(&self, seed: &str) -> String {
        let mut attempt = 0u32;
        loop {
            let digest = format!("{:x}", md5::compute(format!("{}#{}", seed, attempt).as_bytes()));
            let id = digest[..24].to_uppercase();
            if self.object(&id).is_none() && !self.objects().contains_key(&id) {
                return id;
            }
            attempt += 1;
        }
    }
}

static EMPTY: Dict = Dict::empty();

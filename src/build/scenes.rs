//! Enabled scene enumeration
//!
//! Unity keeps the scene list in `ProjectSettings/EditorBuildSettings.asset`:
//!
//! ```text
//! EditorBuildSettings:
//!   m_ObjectHideFlags: 0
//!   serializedVersion: 2
//!   m_Scenes:
//!   - enabled: 1
//!     path: Assets/Scenes/Main.unity
//!     guid: 2cda990e2423bbf4892e6590ba056729
//! ```
//!
//! The file is Unity-flavoured YAML with `!u!` tags, so it is read line by
//! line rather than through a YAML parser.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::utils::terminal::print_warning;

/// Source of the scenes to include in a build
pub trait SceneSource {
    /// Paths of enabled scenes in declared order
    fn enabled_scenes(&self) -> Result<Vec<String>>;
}

/// Scene list backed by an `EditorBuildSettings.asset` file
#[derive(Debug, Clone)]
pub struct EditorBuildSettings {
    path: PathBuf,
}

impl EditorBuildSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SceneSource for EditorBuildSettings {
    fn enabled_scenes(&self) -> Result<Vec<String>> {
        if !self.path.is_file() {
            print_warning(&format!(
                "Scene list {} not found, building without scenes",
                self.path.display()
            ));
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read scene list {}", self.path.display()))?;
        Ok(parse_enabled_scenes(&content))
    }
}

#[derive(Default)]
struct SceneEntry {
    enabled: bool,
    path: Option<String>,
}

/// Extract enabled scene paths from the asset text
pub fn parse_enabled_scenes(content: &str) -> Vec<String> {
    let mut scenes = Vec::new();
    let mut in_scenes = false;
    let mut list_indent = 0;
    let mut item_indent: Option<usize> = None;
    let mut current: Option<SceneEntry> = None;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let indent = line.len() - trimmed.len();

        if !in_scenes {
            if trimmed.starts_with("m_Scenes:") {
                in_scenes = true;
                list_indent = indent;
            }
            continue;
        }

        let is_item = trimmed.starts_with("- ");
        if indent < list_indent || (indent == list_indent && !is_item) {
            break;
        }

        let starts_entry = is_item && item_indent.map_or(true, |i| i == indent);
        let field = if starts_entry {
            item_indent = Some(indent);
            finish_entry(current.take(), &mut scenes);
            current = Some(SceneEntry::default());
            &trimmed[2..]
        } else {
            trimmed
        };

        if let (Some(entry), Some((key, value))) = (current.as_mut(), field.split_once(':')) {
            let value = value.trim();
            match key.trim() {
                "enabled" => entry.enabled = value == "1",
                "path" => entry.path = Some(unquote(value).to_string()),
                _ => {}
            }
        }
    }
    finish_entry(current, &mut scenes);

    scenes
}

fn finish_entry(entry: Option<SceneEntry>, scenes: &mut Vec<String>) {
    if let Some(SceneEntry { enabled: true, path: Some(path) }) = entry {
        if !path.is_empty() {
            scenes.push(path);
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

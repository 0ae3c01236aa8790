//! Xcode project files produced by the Unity iOS export
//!
//! - `plist` - Parser and writer for the old-style property list format
//! - `project` - Target, build setting and build phase operations

pub mod plist;
pub mod project;

pub use project::PbxProject;

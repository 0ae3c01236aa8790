//! Builder configuration

mod builder_toml;

pub use builder_toml::*;

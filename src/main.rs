//! unity-builder - headless player build driver for Unity projects
//!
//! Invoked by CI with Unity-style single-dash flags. Drives the editor
//! through a request/summary protocol and post-processes the exported
//! Android and iOS projects.
//!
//! ## Architecture
//!
//! ```text
//! argv → options/ → build/profile → Unity (external) → build/platforms → exit code
//! ```

mod build;
mod cli;
mod config;
mod error;
mod exec;
mod options;
mod utils;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    std::process::exit(cli::run(&args));
}

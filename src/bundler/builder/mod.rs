//! Finalization orchestration.
//!
//! - [`orchestrator`] - the [`Bundler`] that runs one target's stages
//! - [`checksum`] - SHA-256 of the produced artifact
//! - [`tool_detection`] - preflight lookup of external tools

mod checksum;
mod orchestrator;
mod tool_detection;

pub use checksum::calculate_sha256;
pub use orchestrator::{Bundler, FinalizeOptions};
pub use tool_detection::{preflight, required_tools};

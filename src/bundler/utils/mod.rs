//! Filesystem, link and external process helpers shared by every stage.

pub mod fs;
pub mod link;
pub mod process;

pub use link::{LinkPolicy, SymlinkRecord, check_link_chain, link_to, resolve_relative, symlink_relative};
pub use process::{run_tool, run_tool_in};

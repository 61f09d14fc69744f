//! Packaging finalizer library.
//!
//! Turns a staged build tree into one distributable artifact per run:
//! - macOS disk images (.dmg) with assembled, relinked and signed bundles
//! - Windows installers (_Setup.exe via NSIS)
//! - Linux archives (.tar.gz)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod manifest;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};

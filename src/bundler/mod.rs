//! Finalization of staged build trees into installer artifacts.
//!
//! The staging collaborator hands over a tree of `(source, destination)`
//! pairs. This module turns that tree into exactly one artifact per run:
//!
//! - **Darwin**: bundle assembly, binary relinking, signing inside a mounted
//!   sparse image, compressed read-only `.dmg`
//! - **Windows**: ordered NSIS install/uninstall directives, rendered script,
//!   `makensis` compiled `_Setup.exe`
//! - **Linux**: stripped, permission-normalized tree archived under the
//!   installer base name
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_finalize::bundler::{Bundler, Settings, StagedTree};
//!
//! # async fn example(settings: Settings, tree: StagedTree) -> kodegen_bundler_finalize::bundler::Result<()> {
//! let bundler = Bundler::new(settings, tree)?;
//! let artifact = bundler.finalize().await?;
//! println!("Created {} ({} bytes)", artifact.package_type, artifact.size);
//! # Ok(())
//! # }
//! ```

pub mod assembly;
pub mod builder;
pub mod error;
pub mod platform;
pub mod settings;
pub mod sign;
pub mod staging;
pub mod utils;

pub use builder::{Bundler, FinalizeOptions};
pub use error::{Error, Result};
pub use platform::PackageType;
pub use settings::{
    Arch, BundleSettings, DmgSettings, LinuxSettings, MacOsSettings, PackageSettings,
    PackagingTarget, Platform, Settings, SettingsBuilder, WindowsSettings,
};
pub use staging::{StagedFileEntry, StagedTree};

use std::path::PathBuf;

/// The artifact produced by a finalization run.
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// Kind of artifact.
    pub package_type: PackageType,
    /// Paths making up the artifact (normally one).
    pub paths: Vec<PathBuf>,
    /// Total size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the first path.
    pub checksum: String,
}

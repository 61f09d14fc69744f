//! NSIS installer build execution.
//!
//! Compiles NSI scripts into Windows installer executables using makensis.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    utils::process,
};
use std::ffi::OsStr;
use std::path::Path;

/// Run makensis to compile an NSI script into the installer executable.
///
/// The script's `OutFile` decides the output path; the run fails if the
/// installer does not exist afterwards.
pub async fn run_makensis(makensis: &Path, nsi_path: &Path, installer: &Path) -> Result<()> {
    log::info!("Running makensis on {}", nsi_path.display());

    if let Some(parent) = installer.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating installer output directory", parent)?;
    }

    process::run_tool_in(
        "nsis",
        nsi_path.parent(),
        makensis,
        [
            OsStr::new("-V2"),
            OsStr::new("-INPUTCHARSET"),
            OsStr::new("UTF8"),
            nsi_path.as_os_str(),
        ],
    )
    .await?;

    if !installer.is_file() {
        return Err(Error::MissingResource {
            path: installer.to_path_buf(),
        });
    }
    Ok(())
}

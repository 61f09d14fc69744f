//! Locating `makensis`.

use crate::bundler::error::{Error, Result};
use std::path::PathBuf;

/// Program files variables searched on Windows hosts.
const PROGRAM_FILES_VARS: &[&str] = &["ProgramFiles", "ProgramFiles(x86)"];

/// NSIS install directories below program files.
const NSIS_DIRS: &[&str] = &["NSIS", "NSIS\\Unicode"];

/// Finds `makensis` on `PATH`, then in the standard NSIS install locations.
pub fn locate_makensis() -> Result<PathBuf> {
    if let Ok(path) = which::which("makensis") {
        log::debug!("Found makensis at: {}", path.display());
        return Ok(path);
    }

    for var in PROGRAM_FILES_VARS {
        let Some(program_files) = std::env::var_os(var) else {
            continue;
        };
        for dir in NSIS_DIRS {
            let candidate = PathBuf::from(&program_files).join(dir).join("makensis.exe");
            if candidate.is_file() {
                log::debug!("Found makensis at: {}", candidate.display());
                return Ok(candidate);
            }
        }
    }

    Err(Error::Configuration(
        "makensis not found. Please install NSIS (e.g., apt-get install nsis)".into(),
    ))
}

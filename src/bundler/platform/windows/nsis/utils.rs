//! NSIS utility functions.
//!
//! Helpers for version constants, compression and install mode strings, and
//! writing scripts with the BOM `makensis` expects.

use crate::bundler::{
    error::{ErrorExt, Result},
    settings::{NSISInstallerMode, NsisCompression},
};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Map compression setting to NSIS compression string.
///
/// Defaults to LZMA if no compression is specified.
pub fn map_compression(compression: Option<NsisCompression>) -> &'static str {
    match compression.unwrap_or(NsisCompression::Lzma) {
        NsisCompression::None => "none",
        NsisCompression::Zlib => "zlib",
        NsisCompression::Bzip2 => "bzip2",
        NsisCompression::Lzma => "lzma",
    }
}

/// Whether the install mode defaults to all users.
pub fn is_per_machine(mode: NSISInstallerMode) -> bool {
    matches!(mode, NSISInstallerMode::PerMachine | NSISInstallerMode::Both)
}

/// Format version string for NSIS VIProductVersion.
///
/// NSIS requires exactly 4 numeric parts (major.minor.patch.build):
/// - "1" -> "1.0.0.0"
/// - "1.2.3" -> "1.2.3.0"
/// - "1.2.3.4.5" -> "1.2.3.4"
pub fn format_version_for_nsis(version: &str) -> String {
    let mut parts: Vec<&str> = version.split('.').take(4).collect();
    while parts.len() < 4 {
        parts.push("0");
    }
    parts.join(".")
}

/// `!define` lines for the version constants.
///
/// `VERSION` keeps the first three components, `VERSION_LONG` all of them,
/// `VERSION_DASHES` joins them with dashes and `VERSION_REGISTRY` appends
/// the address size, e.g. `7.1.2.500(64)`.
pub fn version_defines(components: &[&str], address_size: u32, final_exe: &str) -> String {
    let short = components
        .iter()
        .take(components.len().saturating_sub(1).max(1))
        .copied()
        .collect::<Vec<_>>()
        .join(".");
    let long = components.join(".");

    [
        format!("!define VERSION \"{}\"", short),
        format!("!define VERSION_LONG \"{}\"", long),
        format!("!define VERSION_DASHES \"{}\"", components.join("-")),
        format!("!define VERSION_REGISTRY \"{}({})\"", long, address_size),
        format!("!define VIEWER_EXE \"{}\"", final_exe),
    ]
    .join("\n")
}

/// Registry view and program files defines for the address size.
pub fn registry_view(address_size: u32) -> (&'static str, &'static str) {
    if address_size == 64 {
        ("SetRegView 64", "!define MULTIUSER_USE_PROGRAMFILES64")
    } else {
        ("SetRegView 32", "")
    }
}

/// Write file with UTF-8 BOM (required by NSIS).
pub async fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating script directory", parent)?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .fs_context("creating NSI script file", path)?;

    file.write_all(&[0xEF, 0xBB, 0xBF])
        .await
        .fs_context("writing UTF-8 BOM", path)?;
    file.write_all(content.as_bytes())
        .await
        .fs_context("writing NSI content", path)?;
    file.flush().await.fs_context("flushing NSI file", path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_defines_for_four_component_version() {
        let defines = version_defines(&["7", "1", "2", "500"], 64, "KodegenViewer.exe");
        assert!(defines.contains("!define VERSION \"7.1.2\""));
        assert!(defines.contains("!define VERSION_LONG \"7.1.2.500\""));
        assert!(defines.contains("!define VERSION_DASHES \"7-1-2-500\""));
        assert!(defines.contains("!define VERSION_REGISTRY \"7.1.2.500(64)\""));
    }

    #[test]
    fn thirty_two_bit_uses_default_program_files() {
        assert_eq!(registry_view(32), ("SetRegView 32", ""));
        assert_eq!(
            registry_view(64),
            ("SetRegView 64", "!define MULTIUSER_USE_PROGRAMFILES64")
        );
    }

    #[test]
    fn nsis_version_is_padded_to_four_parts() {
        assert_eq!(format_version_for_nsis("7.1"), "7.1.0.0");
        assert_eq!(format_version_for_nsis("7.1.2.500.9"), "7.1.2.500");
    }
}

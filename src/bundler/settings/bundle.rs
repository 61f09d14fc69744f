//! Per-platform configuration container.

use super::{DmgSettings, LinuxSettings, MacOsSettings, WindowsSettings};

/// Per-platform configuration.
///
/// Only the section matching the selected target is consulted.
///
/// # Configuration
///
/// ```toml
/// publisher = "Kodegen Labs"
///
/// [macos]
/// signing_identity = "Developer ID Application: Kodegen Labs"
///
/// [dmg]
/// megabytes = 1300
///
/// [windows.nsis]
/// install_mode = "perMachine"
///
/// [linux]
/// strip_dirs = ["bin", "lib"]
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct BundleSettings {
    /// Publisher/company name.
    ///
    /// Default: None
    #[serde(default)]
    pub publisher: Option<String>,

    /// macOS bundle, relink and signing settings.
    #[serde(default)]
    pub macos: MacOsSettings,

    /// Disk image settings.
    #[serde(default)]
    pub dmg: DmgSettings,

    /// Windows installer settings.
    #[serde(default)]
    pub windows: WindowsSettings,

    /// Linux archive settings.
    #[serde(default)]
    pub linux: LinuxSettings,
}

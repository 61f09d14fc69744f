//! Linux platform-specific settings.

use std::path::PathBuf;

/// Linux archive configuration.
///
/// # Configuration
///
/// ```toml
/// [linux]
/// strip_dirs = ["bin", "lib"]
/// strip_exclude = ["*.py", "*.pak", "*.bin", "*.dat", "*.crt"]
///
/// [[linux.permission_remaps]]
/// from = 0o700
/// to = 0o755
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct LinuxSettings {
    /// Whether to strip debug symbols.
    ///
    /// Default: None (strip release builds only)
    #[serde(default)]
    pub strip: Option<bool>,

    /// Directories (relative to the staged root) whose regular files are
    /// stripped.
    #[serde(default = "default_strip_dirs")]
    pub strip_dirs: Vec<PathBuf>,

    /// File name patterns never stripped.
    #[serde(default = "default_strip_exclude")]
    pub strip_exclude: Vec<String>,

    /// Whether to produce the archive.
    ///
    /// Default: None (archive release builds only)
    #[serde(default)]
    pub archive: Option<bool>,

    /// Mode applied to every directory.
    #[serde(default = "default_directory_mode")]
    pub directory_mode: u32,

    /// Exact-match mode remaps applied to regular files.
    #[serde(default = "default_permission_remaps")]
    pub permission_remaps: Vec<PermissionRemap>,
}

impl Default for LinuxSettings {
    fn default() -> Self {
        Self {
            strip: None,
            strip_dirs: default_strip_dirs(),
            strip_exclude: default_strip_exclude(),
            archive: None,
            directory_mode: default_directory_mode(),
            permission_remaps: default_permission_remaps(),
        }
    }
}

/// One `(old, new)` permission mode remap.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
pub struct PermissionRemap {
    /// Mode bits to match exactly.
    pub from: u32,
    /// Replacement mode bits.
    pub to: u32,
}

fn default_strip_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("bin"), PathBuf::from("lib")]
}

fn default_strip_exclude() -> Vec<String> {
    [
        "*.py",
        "*.sh",
        "*.pak",
        "*.bin",
        "*.dat",
        "*.ttf",
        "*.crt",
        "*.dll",
        "*.lib",
        "update_install",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_directory_mode() -> u32 {
    0o755
}

fn default_permission_remaps() -> Vec<PermissionRemap> {
    vec![
        PermissionRemap { from: 0o700, to: 0o755 },
        PermissionRemap { from: 0o500, to: 0o555 },
        PermissionRemap { from: 0o600, to: 0o644 },
        PermissionRemap { from: 0o400, to: 0o444 },
    ]
}

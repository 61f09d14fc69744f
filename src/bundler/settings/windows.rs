//! Windows platform-specific settings.

use super::RetrySettings;
use std::path::PathBuf;

/// Windows installer configuration.
///
/// # Configuration
///
/// ```toml
/// [windows]
/// final_exe = "KodegenViewer.exe"
/// sign_command = "C:/buildscripts/code-signing/sign.py"
/// sign_interpreter = "python"
/// sign_targets = ["KodegenViewer.exe", "llplugin/dullahan_host.exe"]
///
/// [windows.nsis]
/// install_mode = "perMachine"
/// compression = "lzma"
/// ```
///
/// # See Also
///
/// - [`NsisSettings`] - NSIS installer configuration
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct WindowsSettings {
    /// Name of the main executable inside the staged tree.
    ///
    /// Default: None (`<app name without spaces>.exe`)
    #[serde(default)]
    pub final_exe: Option<String>,

    /// Custom sign command run as `<interpreter> <command> <target>`.
    ///
    /// Default: None (signing skipped)
    #[serde(default)]
    pub sign_command: Option<PathBuf>,

    /// Interpreter used to run `sign_command`.
    ///
    /// Default: None (command executed directly)
    #[serde(default)]
    pub sign_interpreter: Option<PathBuf>,

    /// Executables (relative to the staged root) signed before the script is
    /// compiled. The installer itself is signed afterwards.
    #[serde(default)]
    pub sign_targets: Vec<PathBuf>,

    /// Retry behaviour for transient signing failures.
    #[serde(default)]
    pub retry: RetrySettings,

    /// NSIS EXE installer settings.
    #[serde(default)]
    pub nsis: NsisSettings,
}

/// NSIS installer configuration.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NsisSettings {
    /// Custom NSI template, relative to the source root.
    ///
    /// Default: None (built-in template)
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Installation scope.
    #[serde(default)]
    pub install_mode: NSISInstallerMode,

    /// Compression algorithm.
    ///
    /// Default: None (LZMA)
    #[serde(default)]
    pub compression: Option<NsisCompression>,
}

/// NSIS installation scope.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NSISInstallerMode {
    /// Install for the current user only
    CurrentUser,
    /// Install for all users (requires elevation)
    #[default]
    PerMachine,
    /// Let the user choose
    Both,
}

/// NSIS compression algorithm.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NsisCompression {
    /// No compression
    None,
    /// zlib
    Zlib,
    /// bzip2
    Bzip2,
    /// LZMA
    Lzma,
}

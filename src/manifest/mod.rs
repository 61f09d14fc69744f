//! Packaging manifest loading.
//!
//! One TOML file describes a finalization run: product identity, the
//! packaging target, where the staged tree lives, and the per-platform
//! sections consumed by the bundler stages.
//!
//! ```toml
//! [package]
//! product_name = "Kodegen Viewer"
//! version = "7.1.2.500"
//!
//! [target]
//! platform = "darwin"
//! arch = "x86_64"
//!
//! [paths]
//! staged_root = "build/newview/Kodegen Viewer"
//! source_root = "indra/newview"
//! file_list = "build/staged_files.json"
//!
//! [macos]
//! signing_identity = ""
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use crate::bundler::{
    Arch, BundleSettings, PackageSettings, PackagingTarget, Platform, Settings, SettingsBuilder,
    StagedFileEntry, StagedTree,
};
use crate::error::{BundlerError, CliError, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// `[target]` section.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TargetSection {
    /// Platform family.
    pub platform: Platform,
    /// Architecture of the staged binaries.
    pub arch: Arch,
}

/// `[paths]` section.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PathsSection {
    /// Root of the staged destination tree.
    pub staged_root: PathBuf,
    /// Root that source paths (templates, entitlements, scripts) are
    /// relative to.
    ///
    /// Default: the manifest directory
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    /// Directory receiving the artifact.
    ///
    /// Default: parent of `staged_root`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// JSON list of `[source, destination]` pairs written by staging.
    ///
    /// Default: None (every file under `staged_root` is an entry)
    #[serde(default)]
    pub file_list: Option<PathBuf>,
}

/// A parsed packaging manifest.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PackagingManifest {
    /// Product identity.
    pub package: PackageSettings,
    /// Selected packaging target.
    pub target: TargetSection,
    /// Tree locations.
    pub paths: PathsSection,
    /// Per-platform sections (`[macos]`, `[dmg]`, `[windows]`, `[linux]`).
    #[serde(flatten)]
    pub bundle: BundleSettings,

    /// Directory the manifest was read from.
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Run-time overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ManifestOverrides {
    /// Replaces `paths.output_dir`.
    pub output_dir: Option<PathBuf>,
    /// Replaces `paths.file_list`.
    pub file_list: Option<PathBuf>,
}

impl PackagingManifest {
    /// Reads and parses a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            BundlerError::Cli(CliError::ExecutionFailed {
                command: "read_manifest".to_string(),
                reason: format!("Failed to read {}: {}", path.display(), e),
            })
        })?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&content, base_dir)
    }

    /// Parses manifest text whose relative paths resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: PackagingManifest = toml::from_str(content)?;
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }

    /// Resolves a manifest-relative path to an absolute one without
    /// following symlinks.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        Ok(joined.absolutize()?.into_owned())
    }

    /// The selected packaging target.
    pub fn packaging_target(&self) -> PackagingTarget {
        PackagingTarget::new(self.target.platform, self.target.arch)
    }

    /// Builds the immutable run settings.
    pub fn settings(&self, overrides: &ManifestOverrides) -> Result<Settings> {
        let mut builder = SettingsBuilder::new()
            .package_settings(self.package.clone())
            .bundle_settings(self.bundle.clone())
            .target(self.packaging_target())
            .staged_root(self.resolve(&self.paths.staged_root)?);

        let source_root = match &self.paths.source_root {
            Some(root) => self.resolve(root)?,
            None => self.resolve(Path::new("."))?,
        };
        builder = builder.source_root(source_root);

        if let Some(output_dir) = overrides.output_dir.as_ref().or(self.paths.output_dir.as_ref()) {
            builder = builder.project_out_directory(self.resolve(output_dir)?);
        }

        Ok(builder.build()?)
    }

    /// Loads the staged tree named by the file list, or enumerates the
    /// staged root when no list is given.
    pub async fn staged_tree(&self, overrides: &ManifestOverrides) -> Result<StagedTree> {
        let root = self.resolve(&self.paths.staged_root)?;
        if let Some(list) = overrides.file_list.as_ref().or(self.paths.file_list.as_ref()) {
            let list = self.resolve(list)?;
            return Ok(StagedTree::load(root, &list).await?);
        }

        if !root.is_dir() {
            return Err(BundlerError::Cli(CliError::InvalidArguments {
                reason: format!("staged root {} is not a directory", root.display()),
            }));
        }
        let files = crate::bundler::utils::fs::list_files(&root)?;
        log::debug!("Enumerated {} staged files under {}", files.len(), root.display());
        let entries = files
            .into_iter()
            .map(|path| StagedFileEntry::new(path.clone(), path))
            .collect();
        Ok(StagedTree::new(root, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[package]
product_name = "Kodegen Viewer"
version = "7.1.2.500"

[target]
platform = "windows"
arch = "x64"

[paths]
staged_root = "staged"
output_dir = "out"

[windows]
final_exe = "KodegenViewer.exe"

[linux]
strip_dirs = ["bin"]
"#;

    #[test]
    fn sections_map_onto_settings() {
        let manifest = PackagingManifest::parse(MANIFEST, "/work").unwrap();
        assert_eq!(
            manifest.packaging_target(),
            PackagingTarget::Windows(Arch::X86_64)
        );

        let settings = manifest.settings(&ManifestOverrides::default()).unwrap();
        assert_eq!(settings.staged_root(), Path::new("/work/staged"));
        assert_eq!(settings.project_out_directory(), Path::new("/work/out"));
        assert_eq!(settings.source_root(), Path::new("/work"));
        assert_eq!(
            settings.bundle_settings().windows.final_exe.as_deref(),
            Some("KodegenViewer.exe")
        );
        assert_eq!(
            settings.bundle_settings().linux.strip_dirs,
            vec![PathBuf::from("bin")]
        );
    }

    #[test]
    fn command_line_output_dir_wins() {
        let manifest = PackagingManifest::parse(MANIFEST, "/work").unwrap();
        let overrides = ManifestOverrides {
            output_dir: Some(PathBuf::from("/artifacts")),
            file_list: None,
        };
        let settings = manifest.settings(&overrides).unwrap();
        assert_eq!(settings.project_out_directory(), Path::new("/artifacts"));
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let text = MANIFEST.replace("platform = \"windows\"", "platform = \"beos\"");
        assert!(PackagingManifest::parse(&text, "/work").is_err());
    }

    #[tokio::test]
    async fn tree_is_enumerated_without_a_file_list() {
        let tmp = tempfile::tempdir().unwrap();
        let staged = tmp.path().join("staged");
        std::fs::create_dir_all(staged.join("bin")).unwrap();
        std::fs::write(staged.join("bin/viewer"), b"x").unwrap();

        let manifest = PackagingManifest::parse(MANIFEST, tmp.path()).unwrap();
        let tree = manifest.staged_tree(&ManifestOverrides::default()).await.unwrap();
        assert_eq!(tree.entries().len(), 1);
        assert_eq!(tree.entries()[0].destination, staged.join("bin/viewer"));
    }
}

//! Core Settings struct and implementations.

use super::{BundleSettings, PackageSettings, PackagingTarget};
use std::path::{Path, PathBuf};

/// Main settings for a finalization run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder) and threaded by
/// reference through every stage. Holds the selected target, package
/// metadata, per-platform settings and the three roots a run works with:
///
/// - the staged root (destination tree produced by the staging collaborator)
/// - the source root (templates, entitlements, decorative assets)
/// - the output directory (final artifacts)
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_finalize::bundler::{
///     Arch, PackageSettings, PackagingTarget, Platform, SettingsBuilder,
/// };
///
/// # fn example() -> kodegen_bundler_finalize::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .target(PackagingTarget::new(Platform::Linux, Arch::X86_64))
///     .staged_root("build/packaged")
///     .source_root("indra/newview")
///     .project_out_directory("build")
///     .package_settings(PackageSettings {
///         product_name: "Kodegen Viewer".into(),
///         version: "7.1.2.500".into(),
///         ..Default::default()
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Package metadata.
    package: PackageSettings,

    /// Per-platform configuration.
    bundle_settings: BundleSettings,

    /// Selected platform and architecture.
    target: PackagingTarget,

    /// Root of the staged destination tree.
    staged_root: PathBuf,

    /// Root that decorative assets and templates are resolved against.
    source_root: PathBuf,

    /// Output directory for artifacts.
    project_out_directory: PathBuf,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the dotted version split into its components.
    pub fn version_components(&self) -> Vec<&str> {
        self.package.version.split('.').collect()
    }

    /// Name of the application bundle (without `.app`).
    pub fn app_name(&self) -> &str {
        self.package
            .app_name
            .as_deref()
            .unwrap_or(&self.package.product_name)
    }

    /// Path of the top-level application bundle inside the staged tree.
    pub fn app_bundle_path(&self) -> PathBuf {
        self.staged_root.join(format!("{}.app", self.app_name()))
    }

    /// Whether this is a release build.
    pub fn is_release(&self) -> bool {
        self.package.release
    }

    /// Base name shared by every artifact of this run.
    ///
    /// `<product words joined by _>_<version with _>_<arch>` unless the
    /// manifest sets an explicit name.
    pub fn installer_base_name(&self) -> String {
        if let Some(name) = &self.package.installer_base_name {
            return name.clone();
        }

        let product = self
            .package
            .product_name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        let version = self.package.version.replace('.', "_");
        format!("{}_{}_{}", product, version, self.target.arch())
    }

    /// Returns the selected target.
    pub fn target(&self) -> PackagingTarget {
        self.target
    }

    /// Returns the staged root directory.
    pub fn staged_root(&self) -> &Path {
        &self.staged_root
    }

    /// Returns the source root directory.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Resolves a path relative to the source root.
    pub fn source_path_of(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.source_root.join(relative)
    }

    /// Returns the output directory for artifacts.
    pub fn project_out_directory(&self) -> &Path {
        &self.project_out_directory
    }

    /// Returns the per-platform settings.
    pub fn bundle_settings(&self) -> &BundleSettings {
        &self.bundle_settings
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        package: PackageSettings,
        bundle_settings: BundleSettings,
        target: PackagingTarget,
        staged_root: PathBuf,
        source_root: PathBuf,
        project_out_directory: PathBuf,
    ) -> Self {
        Self {
            package,
            bundle_settings,
            target,
            staged_root,
            source_root,
            project_out_directory,
        }
    }
}

//! Builder for constructing Settings.

use super::{BundleSettings, PackageSettings, PackagingTarget, Settings};
use crate::bundler::Error;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
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
///     .target(PackagingTarget::new(Platform::Windows, Arch::X86_64))
///     .staged_root("build/packaged")
///     .package_settings(PackageSettings {
///         product_name: "Kodegen Viewer".into(),
///         version: "7.1.2.500".into(),
///         ..Default::default()
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    package_settings: Option<PackageSettings>,
    bundle_settings: BundleSettings,
    target: Option<PackagingTarget>,
    staged_root: Option<PathBuf>,
    source_root: Option<PathBuf>,
    project_out_directory: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets package metadata.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Sets per-platform configuration.
    ///
    /// Default: Empty [`BundleSettings`]
    pub fn bundle_settings(mut self, settings: BundleSettings) -> Self {
        self.bundle_settings = settings;
        self
    }

    /// Sets the packaging target.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn target(mut self, target: PackagingTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the staged tree root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn staged_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.staged_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the source root for templates and assets.
    ///
    /// Default: current directory
    pub fn source_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the artifact output directory.
    ///
    /// Default: parent of the staged root
    pub fn project_out_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_out_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a required field is missing or the
    /// package metadata is empty.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        let package = self
            .package_settings
            .ok_or_else(|| Error::Configuration("package_settings is required".into()))?;
        let target = self
            .target
            .ok_or_else(|| Error::Configuration("target is required".into()))?;
        let staged_root = self
            .staged_root
            .ok_or_else(|| Error::Configuration("staged_root is required".into()))?;

        if package.product_name.trim().is_empty() {
            return Err(Error::Configuration("product_name must not be empty".into()));
        }
        if package.version.split('.').any(|part| part.is_empty()) {
            return Err(Error::Configuration(format!(
                "version {:?} is not a dotted version",
                package.version
            )));
        }

        let source_root = self.source_root.unwrap_or_else(|| PathBuf::from("."));
        let project_out_directory = self.project_out_directory.unwrap_or_else(|| {
            staged_root
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        Ok(Settings::new(
            package,
            self.bundle_settings,
            target,
            staged_root,
            source_root,
            project_out_directory,
        ))
    }
}

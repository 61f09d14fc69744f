//! Main finalization orchestrator.

use crate::bundler::{
    BundledArtifact, PackageType, Result, Settings,
    error::{Context, Error},
    platform::{linux, macos, windows::nsis},
    settings::Platform,
    staging::StagedTree,
    utils::fs,
};
use std::path::PathBuf;

use super::{checksum::calculate_sha256, tool_detection};

/// Switches that change what a run produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizeOptions {
    /// Leave the normalized tree in place instead of archiving it.
    pub skip_archive: bool,
    /// Render installer scripts only; no tool runs and the tree is untouched.
    pub scripts_only: bool,
}

/// Runs the stages of one packaging target over a staged tree.
///
/// The target is fixed by [`Settings`]; the bundler dispatches once and runs
/// that platform's stages in program order:
///
/// - **Darwin**: assemble bundles, relink binaries, build and sign the DMG
/// - **Windows**: sign staged executables, render and compile the NSIS script
/// - **Linux**: strip, normalize permissions, archive
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_finalize::bundler::{Bundler, FinalizeOptions, Settings, StagedTree};
///
/// # async fn example(settings: Settings, tree: StagedTree) -> kodegen_bundler_finalize::bundler::Result<()> {
/// let artifact = Bundler::new(settings, tree)?
///     .with_options(FinalizeOptions { skip_archive: true, ..Default::default() })
///     .finalize()
///     .await?;
/// println!("SHA256: {}", artifact.checksum);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    settings: Settings,
    tree: StagedTree,
    options: FinalizeOptions,
}

impl Bundler {
    /// Creates a bundler for a staged tree.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the staged root is not a directory or
    /// differs from the one in `settings`.
    pub fn new(settings: Settings, tree: StagedTree) -> Result<Self> {
        if tree.root() != settings.staged_root() {
            return Err(Error::Configuration(format!(
                "staged tree root {} does not match configured root {}",
                tree.root().display(),
                settings.staged_root().display()
            )));
        }
        if !tree.root().is_dir() {
            return Err(Error::Configuration(format!(
                "staged root {} is not a directory",
                tree.root().display()
            )));
        }

        Ok(Self {
            settings,
            tree,
            options: FinalizeOptions::default(),
        })
    }

    /// Replaces the run options.
    pub fn with_options(mut self, options: FinalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the staged tree.
    pub fn tree(&self) -> &StagedTree {
        &self.tree
    }

    /// Runs the selected target's stages and describes the artifact.
    ///
    /// Any stage failure aborts the run; nothing already produced is rolled
    /// back.
    pub async fn finalize(&self) -> Result<BundledArtifact> {
        let target = self.settings.target();
        let package_type = target.package_type();
        log::info!(
            "Finalizing {} {} for {}",
            self.settings.product_name(),
            self.settings.version_string(),
            target
        );

        tool_detection::preflight(&self.settings, self.options.scripts_only)?;

        let paths = if self.options.scripts_only {
            self.render_scripts().await?
        } else {
            let produced = match target.platform() {
                Platform::Darwin => macos::bundle_project(&self.settings, &self.tree).await,
                Platform::Windows => nsis::bundle_project(&self.settings, &self.tree).await,
                Platform::Linux => {
                    linux::bundle_project(&self.settings, self.options.skip_archive).await
                }
            };
            produced.with_context(|| format!("{} finalization for {}", package_type, target))?
        };

        self.describe(package_type, paths).await
    }

    async fn render_scripts(&self) -> Result<Vec<PathBuf>> {
        if self.settings.target().platform() != Platform::Windows {
            return Err(Error::Configuration(format!(
                "script rendering is not available for {}",
                self.settings.target()
            )));
        }
        let output_dir = self.settings.project_out_directory();
        fs::create_dir_all(output_dir, false).await?;
        let installer = output_dir.join(nsis::installer_file_name(&self.settings));
        let script = nsis::write_script(&self.settings, &self.tree, &installer).await?;
        log::info!("✓ Rendered installer script: {}", script.display());
        Ok(vec![script])
    }

    async fn describe(&self, package_type: PackageType, paths: Vec<PathBuf>) -> Result<BundledArtifact> {
        let Some(first) = paths.first() else {
            return Err(Error::GenericError(format!(
                "{} finalization returned no artifact",
                package_type
            )));
        };

        let mut size = 0;
        for path in &paths {
            if !path.exists() {
                return Err(Error::MissingResource { path: path.clone() });
            }
            size += fs::disk_usage(path)?;
        }
        let checksum = calculate_sha256(first).await?;

        log::info!("✓ {} artifact ready: {} ({} bytes)", package_type, first.display(), size);
        Ok(BundledArtifact {
            package_type,
            paths,
            size,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{Arch, PackageSettings, PackagingTarget, SettingsBuilder};

    fn settings(root: &std::path::Path, platform: Platform) -> Settings {
        SettingsBuilder::new()
            .package_settings(PackageSettings {
                product_name: "Viewer".into(),
                version: "1.2.3.4".into(),
                release: false,
                ..Default::default()
            })
            .target(PackagingTarget::new(platform, Arch::X86_64))
            .staged_root(root)
            .project_out_directory(root.parent().unwrap().join("out"))
            .build()
            .unwrap()
    }

    #[test]
    fn mismatched_tree_root_is_a_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("staged");
        std::fs::create_dir_all(&root).unwrap();
        let tree = StagedTree::new(tmp.path().join("elsewhere"), Vec::new());

        let err = Bundler::new(settings(&root, Platform::Linux), tree).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn script_rendering_is_windows_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("staged");
        std::fs::create_dir_all(&root).unwrap();
        let tree = StagedTree::new(&root, Vec::new());

        let bundler = Bundler::new(settings(&root, Platform::Linux), tree)
            .unwrap()
            .with_options(FinalizeOptions {
                scripts_only: true,
                ..Default::default()
            });
        assert!(matches!(bundler.finalize().await, Err(Error::Configuration(_))));
    }
}

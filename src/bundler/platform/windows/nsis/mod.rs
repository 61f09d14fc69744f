//! Windows NSIS installer creation.
//!
//! Turns the staged file list into a self-installing executable.
//!
//! # Module Organization
//!
//! - `directives` - ordered install/uninstall directives from the file list
//! - `template` - built-in NSI script template and its required placeholders
//! - `script` - typed field collection and strict Handlebars rendering
//! - `toolset` - makensis location
//! - `build` - makensis execution
//! - `utils` - version constants, compression, BOM writing

pub mod directives;
mod build;
mod script;
mod template;
mod toolset;
mod utils;

pub use directives::{InstallerDirective, install_directives, uninstall_directives};
pub use script::{
    InstallerScriptFields, check_placeholders, generate_nsi_script, installer_file_name,
    render_script,
};
pub use template::{NSI_TEMPLATE, REQUIRED_PLACEHOLDERS};
pub use toolset::locate_makensis;

use crate::bundler::{
    error::{Context, Result},
    settings::Settings,
    sign::{CommandSigner, RetryPolicy, SignPlan, SigningPipeline},
    staging::StagedTree,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Bundle the staged tree as an NSIS installer.
///
/// # Process
///
/// 1. Locate makensis
/// 2. Sign configured executables inside the staged tree
/// 3. Render the installer script (install and delete regions from the
///    file list) and write it with a UTF-8 BOM
/// 4. Compile `<base>_Setup.exe` with makensis
/// 5. Sign the installer
///
/// # Returns
///
/// Vector containing the path to the generated installer.
pub async fn bundle_project(settings: &Settings, tree: &StagedTree) -> Result<Vec<PathBuf>> {
    log::info!("Building NSIS installer for {}", settings.product_name());

    let makensis = locate_makensis()?;
    let output_dir = settings.project_out_directory().to_path_buf();
    fs::create_dir_all(&output_dir, false).await?;

    let staged_targets: Vec<PathBuf> = settings
        .bundle_settings()
        .windows
        .sign_targets
        .iter()
        .map(|target| tree.require(target))
        .collect::<Result<_>>()?;
    sign_files(settings, &staged_targets)
        .await
        .context("signing staged executables")?;

    let installer = output_dir.join(installer_file_name(settings));
    let nsi_path = write_script(settings, tree, &installer).await?;
    build::run_makensis(&makensis, &nsi_path, &installer).await?;

    sign_files(settings, std::slice::from_ref(&installer))
        .await
        .context("signing NSIS installer")?;

    log::info!("✓ Created NSIS installer: {}", installer.display());
    Ok(vec![installer])
}

/// Renders and writes the installer script without compiling it.
pub async fn write_script(settings: &Settings, tree: &StagedTree, installer: &Path) -> Result<PathBuf> {
    let output_dir = installer
        .parent()
        .unwrap_or_else(|| settings.project_out_directory());
    generate_nsi_script(settings, tree, installer, output_dir).await
}

/// Signs `files` with the configured signing command.
///
/// Skipped with a notice when no command is configured or it does not
/// exist.
async fn sign_files(settings: &Settings, files: &[PathBuf]) -> Result<()> {
    let windows = &settings.bundle_settings().windows;
    let Some(command) = &windows.sign_command else {
        log::info!("Skipping code signing: no sign command configured");
        return Ok(());
    };
    let command = settings.source_path_of(command);
    if !command.exists() {
        log::info!("Skipping code signing: {} not found", command.display());
        return Ok(());
    }

    let plan = files.iter().fold(SignPlan::new(), |plan, file| plan.plain(file));
    let signer = CommandSigner::new(command, windows.sign_interpreter.clone());
    let policy = RetryPolicy::from(windows.retry.clone());
    SigningPipeline::new(signer, policy).run(&plan).await
}

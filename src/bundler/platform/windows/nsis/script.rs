//! NSIS installer script generation.
//!
//! The script is rendered with Handlebars in strict mode from a typed field
//! struct. Templates are checked for the required placeholders before
//! rendering so a template missing a region fails loudly instead of
//! producing an installer that installs nothing.

use super::{
    directives::{self, InstallerDirective},
    template::{NSI_TEMPLATE, REQUIRED_PLACEHOLDERS},
    utils,
};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::Settings,
    staging::StagedTree,
};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Every value substituted into the installer template.
#[derive(Clone, Debug, Serialize)]
pub struct InstallerScriptFields {
    /// `!define` lines for the version constants.
    pub version_defines: String,
    /// Staged root the `File` directives pack from.
    pub source_root: String,
    /// Output file, install name, shortcut and caption defines.
    pub inst_vars: String,
    /// Program files define for 64-bit targets.
    pub program_files: String,
    /// Registry view switch.
    pub engage_registry: String,
    /// Ordered install directives.
    pub install_files: String,
    /// Ordered delete and removal directives.
    pub delete_files: String,
    /// Four-part version for `VIProductVersion`.
    pub version_nsis: String,
    /// Publisher shown in the registry.
    pub publisher: String,
    /// Solid compressor name.
    pub compression: String,
    /// Whether the default install mode is all users.
    pub per_machine: bool,
}

/// Installer file name for a run: `<base>_Setup.exe`.
pub fn installer_file_name(settings: &Settings) -> String {
    format!("{}_Setup.exe", settings.installer_base_name())
}

/// Executable the installer's shortcuts point at.
pub fn final_exe(settings: &Settings) -> String {
    settings
        .bundle_settings()
        .windows
        .final_exe
        .clone()
        .unwrap_or_else(|| format!("{}.exe", one_word(settings.app_name())))
}

fn one_word(name: &str) -> String {
    name.split_whitespace().collect()
}

impl InstallerScriptFields {
    /// Collects the fields for `settings` and the staged file list.
    pub fn collect(settings: &Settings, tree: &StagedTree, installer: &Path) -> Result<Self> {
        let files = directives::installable_files(tree);
        if files.is_empty() {
            return Err(Error::Configuration(format!(
                "no staged files under {} to install",
                tree.root().display()
            )));
        }
        let install: Vec<InstallerDirective> = directives::install_directives(&files, tree.root())?;
        let uninstall = directives::uninstall_directives(&files, tree.root())?;

        let address_size = settings.target().address_size();
        let (engage_registry, program_files) = utils::registry_view(address_size);
        let nsis = &settings.bundle_settings().windows.nsis;

        let caption = if settings.is_release() {
            settings.product_name().to_string()
        } else {
            format!("{} ${{VERSION}}", settings.app_name())
        };
        let inst_vars = [
            format!("OutFile \"{}\"", installer.display()),
            format!("!define INSTNAME \"{}\"", one_word(settings.app_name())),
            format!("!define SHORTCUT \"{}\"", settings.app_name()),
            format!("Caption \"{}\"", caption),
        ]
        .join("\n");

        Ok(Self {
            version_defines: utils::version_defines(
                &settings.version_components(),
                address_size,
                &final_exe(settings),
            ),
            source_root: tree.root().display().to_string(),
            inst_vars,
            program_files: program_files.to_string(),
            engage_registry: engage_registry.to_string(),
            install_files: directives::render(&install),
            delete_files: directives::render(&uninstall),
            version_nsis: utils::format_version_for_nsis(settings.version_string()),
            publisher: settings
                .bundle_settings()
                .publisher
                .clone()
                .unwrap_or_else(|| settings.product_name().to_string()),
            compression: utils::map_compression(nsis.compression).to_string(),
            per_machine: utils::is_per_machine(nsis.install_mode),
        })
    }
}

/// Fails when `template` does not reference every required placeholder.
pub fn check_placeholders(template: &str) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_PLACEHOLDERS
        .iter()
        .copied()
        // `{{{name}}}` contains `{{name}}`, so one check covers both forms.
        .filter(|name| !template.contains(&format!("{{{{{}}}}}", name)))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Template(format!(
            "installer template is missing placeholder(s): {}",
            missing.join(", ")
        )))
    }
}

/// Renders `template` with `fields`.
pub fn render_script(template: &str, fields: &InstallerScriptFields) -> Result<String> {
    check_placeholders(template)?;

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    handlebars
        .register_template_string("installer.nsi", template)
        .map_err(|e| Error::Template(format!("failed to register NSI template: {}", e)))?;

    handlebars
        .render("installer.nsi", fields)
        .map_err(|e| Error::Template(format!("failed to render NSI template: {}", e)))
}

/// Loads the configured template, or the built-in one.
pub async fn load_template(settings: &Settings) -> Result<String> {
    match &settings.bundle_settings().windows.nsis.template {
        Some(template) => {
            let path = settings.source_path_of(template);
            tokio::fs::read_to_string(&path)
                .await
                .fs_context("reading installer template", &path)
        }
        None => Ok(NSI_TEMPLATE.to_string()),
    }
}

/// Generates the installer script next to the installer and returns its
/// path.
pub async fn generate_nsi_script(
    settings: &Settings,
    tree: &StagedTree,
    installer: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    let template = load_template(settings).await?;
    let fields = InstallerScriptFields::collect(settings, tree, installer)?;
    let content = render_script(&template, &fields)?;

    let nsi_path = output_dir.join(format!("{}_setup.nsi", settings.installer_base_name()));
    utils::write_utf8_bom(&nsi_path, &content).await?;
    log::info!("✓ Wrote installer script {}", nsi_path.display());
    Ok(nsi_path)
}

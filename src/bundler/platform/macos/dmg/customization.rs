//! Filling the mounted volume: the application bundle, decorative assets
//! and the drag-to-install alias.
//!
//! Finder layout (background, icon positions) comes from a prebuilt
//! `.DS_Store` in the template directory, which is why the volume name must
//! stay fixed.

use crate::bundler::{
    error::Result,
    settings::Settings,
    utils::{fs, process},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Decorative assets: template file name and name on the volume.
pub const DECORATIVE_ASSETS: &[(&str, &str)] = &[
    ("_VolumeIcon.icns", ".VolumeIcon.icns"),
    ("background.jpg", "background.jpg"),
    ("_DS_Store", ".DS_Store"),
];

/// Name of the drag target on the volume.
pub const APPLICATIONS_ALIAS: &str = "Applications";

/// Template directory for this run, falling back when the configured one
/// does not exist.
pub fn template_dir(settings: &Settings) -> PathBuf {
    let dmg = &settings.bundle_settings().dmg;
    let configured = settings.source_path_of(&dmg.template_dir);
    if configured.is_dir() {
        configured
    } else {
        log::debug!(
            "{} not found, using {}",
            configured.display(),
            dmg.fallback_template_dir.display()
        );
        settings.source_path_of(&dmg.fallback_template_dir)
    }
}

/// Copies the app bundle and decorative assets into `volume` and sets
/// their Finder attributes. Returns the app bundle's path on the volume.
pub async fn populate_volume(settings: &Settings, volume: &Path) -> Result<PathBuf> {
    let app = settings.app_bundle_path();
    let app_in_volume = volume.join(format!("{}.app", settings.app_name()));
    log::info!("Copying {} to {}", app.display(), volume.display());
    fs::copy_dir(&app, &app_in_volume).await?;

    let template = template_dir(settings);
    for (source_name, volume_name) in DECORATIVE_ASSETS {
        let source = template.join(source_name);
        if !source.is_file() {
            log::info!("Skipping {} (not in template)", source.display());
            continue;
        }
        let destination = volume.join(volume_name);
        fs::copy_file(&source, &destination).await?;
        set_file_attributes("V", &destination).await?;
    }

    let alias_resource = match &settings.bundle_settings().dmg.alias_resource {
        Some(resource) => settings.source_path_of(resource),
        None => settings
            .source_path_of(&settings.bundle_settings().dmg.fallback_template_dir)
            .join("Applications-alias.r"),
    };
    let alias = volume.join(APPLICATIONS_ALIAS);
    process::run_tool(
        "dmg",
        "Rez",
        [alias_resource.as_os_str(), OsStr::new("-o"), alias.as_os_str()],
    )
    .await?;
    set_file_attributes("AC", &alias).await?;
    set_file_attributes("C", volume).await?;

    log::info!("✓ Populated volume {}", volume.display());
    Ok(app_in_volume)
}

/// Sets Finder attribute bits with `SetFile -a`.
async fn set_file_attributes(attributes: &str, path: &Path) -> Result<()> {
    process::run_tool(
        "dmg",
        "SetFile",
        [OsStr::new("-a"), OsStr::new(attributes), path.as_os_str()],
    )
    .await?;
    Ok(())
}

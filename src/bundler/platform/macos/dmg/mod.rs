//! macOS DMG disk image creator.
//!
//! Builds the final image around a sparse, growable scratch image:
//!
//! - `creation` - sparse image creation, private attach, forced detach
//! - `customization` - app bundle, decorative assets and alias on the volume
//! - `conversion` - sparse image to compressed UDZO

mod conversion;
mod creation;
mod customization;

pub use conversion::convert_to_compressed;
pub use creation::{
    DiskImageTool, Hdiutil, MountedVolume, attach_private, create_sparse_image, detach,
    parse_attach_output, with_attached,
};
pub use customization::{DECORATIVE_ASSETS, populate_volume, template_dir};

use crate::bundler::{error::Result, settings::Settings, utils::fs};
use std::path::PathBuf;

/// Bundle the assembled, relinked app as a DMG disk image.
///
/// # Process
/// 1. Remove stale sparse and final images
/// 2. Create and privately attach the sparse image
/// 3. Copy the app and decorative assets, set Finder attributes
/// 4. Sign, verify and notarize the app copy on the volume
/// 5. Detach the volume, whether or not steps 3-4 succeeded
/// 6. Convert to compressed UDZO and remove the sparse image
///
/// # Returns
/// Vector containing the path to the created DMG file.
pub async fn bundle_project(settings: &Settings) -> Result<Vec<PathBuf>> {
    log::info!("Creating DMG for {}", settings.product_name());

    let dmg = &settings.bundle_settings().dmg;
    let output_dir = settings.project_out_directory();
    fs::create_dir_all(output_dir, false).await?;

    let base = settings.installer_base_name();
    let sparse = output_dir.join(format!("{}.sparseimage", base));
    let final_image = output_dir.join(format!("{}.dmg", base));
    fs::remove_any(&sparse).await?;
    fs::remove_any(&final_image).await?;

    let volume_name = dmg
        .volume_name
        .clone()
        .unwrap_or_else(|| format!("{} Installer", settings.product_name()));
    create_sparse_image(&sparse, &volume_name, dmg).await?;

    with_attached(&Hdiutil, &sparse, |mounted| async move {
        fill_and_sign(settings, &mounted).await
    })
    .await?;

    convert_to_compressed(&sparse, &final_image, dmg.zlib_level).await?;

    log::info!("✓ Created DMG: {}", final_image.display());
    Ok(vec![final_image])
}

async fn fill_and_sign(settings: &Settings, mounted: &MountedVolume) -> Result<()> {
    let app_in_volume = populate_volume(settings, &mounted.volume).await?;
    super::signing::sign_volume_copy(settings, &app_in_volume).await
}

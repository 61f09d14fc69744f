//! Linux finalization: strip, normalize permissions, archive.

pub mod archive;
pub mod permissions;
pub mod strip;

use crate::bundler::{error::Result, settings::Settings, utils::fs};
use std::path::PathBuf;

/// Finalizes the staged tree into a compressed tarball.
///
/// Stripping and archiving default to release builds only. With archiving
/// off, the normalized staged tree itself is the artifact.
pub async fn bundle_project(settings: &Settings, skip_archive: bool) -> Result<Vec<PathBuf>> {
    let root = settings.staged_root();
    let linux = &settings.bundle_settings().linux;
    let release = settings.is_release();

    if linux.strip.unwrap_or(release) {
        strip::strip_binaries(root, linux).await?;
    } else {
        log::info!("Skipping strip (not a release build)");
    }

    {
        let root = root.to_path_buf();
        let linux = linux.clone();
        tokio::task::spawn_blocking(move || permissions::normalize_permissions(&root, &linux))
            .await
            .map_err(|e| {
                crate::bundler::Error::GenericError(format!("permission task panicked: {}", e))
            })??;
    }

    if skip_archive || !linux.archive.unwrap_or(release) {
        log::info!("Skipping archive, leaving {}", root.display());
        return Ok(vec![root.to_path_buf()]);
    }

    let output_dir = settings.project_out_directory();
    fs::create_dir_all(output_dir, false).await?;
    let archive = archive::archive_tree(root, &settings.installer_base_name(), output_dir).await?;
    Ok(vec![archive])
}

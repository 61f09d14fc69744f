//! Sparse image to compressed read-only image conversion.

use crate::bundler::{error::Result, utils::process};
use std::ffi::OsStr;
use std::path::Path;

/// Converts the sparse image to UDZO at `zlib_level` and removes the
/// sparse image.
///
/// Must run after the volume is detached.
pub async fn convert_to_compressed(sparse: &Path, final_image: &Path, zlib_level: u8) -> Result<()> {
    log::info!("Converting {} to {}", sparse.display(), final_image.display());
    let image_key = format!("zlib-level={}", zlib_level);

    process::run_tool(
        "dmg",
        "hdiutil",
        [
            OsStr::new("convert"),
            sparse.as_os_str(),
            OsStr::new("-format"),
            OsStr::new("UDZO"),
            OsStr::new("-imagekey"),
            OsStr::new(&image_key),
            OsStr::new("-o"),
            final_image.as_os_str(),
        ],
    )
    .await?;

    crate::bundler::utils::fs::remove_any(sparse).await?;
    log::info!("✓ DMG converted to compressed UDZO format");
    Ok(())
}

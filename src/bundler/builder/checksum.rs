//! Artifact checksums.
//!
//! Archives and images are hashed as single files. A tree left in place
//! (archival skipped) is hashed entry by entry in sorted order, with
//! symlinks contributing their target text instead of the pointee.

use crate::bundler::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hex-encoded SHA-256 of a file or directory tree.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;

    let mut hasher = Sha256::new();
    if metadata.is_file() {
        hash_file(&mut hasher, path).await?;
    } else if metadata.is_dir() {
        hash_tree(&mut hasher, path).await?;
    } else {
        return Err(Error::GenericError(format!(
            "artifact {} is neither a file nor a directory",
            path.display()
        )));
    }
    Ok(format!("{:x}", hasher.finalize()))
}

async fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; 8192];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hashing", path)?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..n]);
    }
}

async fn hash_tree(hasher: &mut Sha256, root: &Path) -> Result<()> {
    let mut entries = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            entries.push(entry);
        }
    }
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in entries {
        let relative = entry.path().strip_prefix(root)?;
        hasher.update(relative.to_string_lossy().as_bytes());
        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading link", entry.path())?;
            hasher.update(b"->");
            hasher.update(target.to_string_lossy().as_bytes());
        } else {
            hash_file(hasher, entry.path()).await?;
        }
    }
    Ok(())
}

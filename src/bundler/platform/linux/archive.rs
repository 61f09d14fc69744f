//! Compressed tarball of the staged tree.
//!
//! The tree is renamed to the artifact base name for the duration of the
//! build so the archive unpacks into a directory of that name, then renamed
//! back whatever happens.

use crate::bundler::error::{Error, ErrorExt, Result};
use flate2::{Compression, write::GzEncoder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Archives `staged_root` as `<output_dir>/<base_name>.tar.gz`.
///
/// The top-level entry of the archive is `base_name`. Symlinks are stored as
/// links, owners are stored numerically as 0.
pub async fn archive_tree(staged_root: &Path, base_name: &str, output_dir: &Path) -> Result<PathBuf> {
    let parent = staged_root
        .parent()
        .ok_or_else(|| Error::Configuration(format!("{} has no parent", staged_root.display())))?;
    let renamed = parent.join(base_name);
    let archive = output_dir.join(format!("{}.tar.gz", base_name));

    if renamed == staged_root {
        write_archive(staged_root.to_path_buf(), base_name.to_string(), archive.clone()).await?;
        return Ok(archive);
    }
    if tokio::fs::symlink_metadata(&renamed).await.is_ok() {
        return Err(Error::Configuration(format!(
            "cannot rename staged tree: {} already exists",
            renamed.display()
        )));
    }

    tokio::fs::rename(staged_root, &renamed)
        .await
        .fs_context("renaming staged tree to", &renamed)?;

    let written = write_archive(renamed.clone(), base_name.to_string(), archive.clone()).await;
    let restored = tokio::fs::rename(&renamed, staged_root)
        .await
        .fs_context("restoring staged tree", staged_root);
    if let (Err(_), Err(e)) = (&written, &restored) {
        log::warn!("{}", e);
    }
    written?;
    restored?;

    log::info!("✓ Created archive: {}", archive.display());
    Ok(archive)
}

async fn write_archive(source: PathBuf, base_name: String, archive: PathBuf) -> Result<()> {
    if let Some(dir) = archive.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .fs_context("creating directory", dir)?;
    }

    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = File::create(&archive).fs_context("creating archive", &archive)?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);

        append_tree(&mut builder, &source, Path::new(&base_name))?;

        let encoder = builder.into_inner()?;
        encoder.finish()?;
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("archive task panicked: {}", e)))?
}

fn append_tree<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    source: &Path,
    prefix: &Path,
) -> Result<()> {
    let walker = walkdir::WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let name = prefix.join(relative);
        let metadata = entry.path().symlink_metadata().fs_context("inspecting", entry.path())?;

        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&metadata, tar::HeaderMode::Complete);
        header.set_uid(0);
        header.set_gid(0);

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading link", entry.path())?;
            header.set_size(0);
            builder.append_link(&mut header, &name, &target)?;
        } else if file_type.is_dir() {
            header.set_size(0);
            builder.append_data(&mut header, &name, std::io::empty())?;
        } else if file_type.is_file() {
            let mut file = File::open(entry.path()).fs_context("opening", entry.path())?;
            builder.append_data(&mut header, &name, &mut file)?;
        } else {
            log::debug!("Skipping special file {}", entry.path().display());
        }
    }
    Ok(())
}

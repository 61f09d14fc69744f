//! Permission normalization of the staged tree.

use crate::bundler::{
    error::{ErrorExt, Result},
    settings::{LinuxSettings, PermissionRemap},
};
use std::path::Path;

/// Returns the replacement for `mode`, if any remap matches exactly.
///
/// Only the permission bits (`0o7777`) take part in the comparison.
pub fn remapped_mode(mode: u32, remaps: &[PermissionRemap]) -> Option<u32> {
    let bits = mode & 0o7777;
    remaps.iter().find(|remap| remap.from == bits).map(|remap| remap.to)
}

/// Sets every directory to the directory mode and remaps regular files.
///
/// Symlinks are left alone. Returns the number of entries changed.
#[cfg(unix)]
pub fn normalize_permissions(root: &Path, linux: &LinuxSettings) -> Result<usize> {
    use std::os::unix::fs::PermissionsExt;

    let mut changed = 0;
    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            continue;
        }

        let metadata = entry.metadata()?;
        let current = metadata.permissions().mode() & 0o7777;
        let wanted = if file_type.is_dir() {
            Some(linux.directory_mode)
        } else if file_type.is_file() {
            remapped_mode(current, &linux.permission_remaps)
        } else {
            None
        };

        if let Some(mode) = wanted {
            if mode != current {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                    .fs_context("setting permissions", path)?;
                changed += 1;
            }
        }
    }

    log::debug!("Normalized permissions of {} entries under {}", changed, root.display());
    Ok(changed)
}

#[cfg(not(unix))]
pub fn normalize_permissions(root: &Path, _linux: &LinuxSettings) -> Result<usize> {
    log::debug!("Skipping permission normalization of {} (no unix modes)", root.display());
    Ok(0)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn mode_of(path: &Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[test]
    fn remap_matches_exact_bits_only() {
        let remaps = LinuxSettings::default().permission_remaps;
        assert_eq!(remapped_mode(0o100700, &remaps), Some(0o755));
        assert_eq!(remapped_mode(0o400, &remaps), Some(0o444));
        assert_eq!(remapped_mode(0o640, &remaps), None);
    }

    #[test]
    fn directories_and_matching_files_are_normalized() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("tree");
        let sub = root.join("bin");
        std::fs::create_dir_all(&sub).unwrap();
        let exe = sub.join("viewer");
        let data = sub.join("data.txt");
        let odd = sub.join("odd.txt");
        std::fs::write(&exe, b"x").unwrap();
        std::fs::write(&data, b"x").unwrap();
        std::fs::write(&odd, b"x").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o700)).unwrap();
        std::fs::set_permissions(&data, std::fs::Permissions::from_mode(0o600)).unwrap();
        std::fs::set_permissions(&odd, std::fs::Permissions::from_mode(0o640)).unwrap();
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o700)).unwrap();

        normalize_permissions(&root, &LinuxSettings::default()).unwrap();

        assert_eq!(mode_of(&sub), 0o755);
        assert_eq!(mode_of(&root), 0o755);
        assert_eq!(mode_of(&exe), 0o755);
        assert_eq!(mode_of(&data), 0o644);
        assert_eq!(mode_of(&odd), 0o640);
    }
}

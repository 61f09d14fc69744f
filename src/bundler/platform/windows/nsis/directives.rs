//! Install and uninstall directives derived from the staged file list.
//!
//! Files are ordered deepest first (by component count, then path, both
//! descending) so files sharing an output directory are adjacent and each
//! directory change costs one `SetOutPath`. Uninstall deletes every file,
//! then removes every ancestor directory once, deepest first. `RMDir`
//! without `/r` leaves non-empty directories alone, so removal is best
//! effort.

use crate::bundler::{error::Result, staging::StagedTree};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// One installer script directive.
///
/// Paths are relative to the install root, except [`InstallFile`], which
/// carries the staged file that `makensis` packs.
///
/// [`InstallFile`]: InstallerDirective::InstallFile
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstallerDirective {
    /// Following files are installed into this directory.
    SetOutputDir(PathBuf),
    /// Pack this staged file into the current output directory.
    InstallFile(PathBuf),
    /// Delete this installed file.
    DeleteFile(PathBuf),
    /// Remove this installed directory if empty.
    RemoveDir(PathBuf),
}

impl InstallerDirective {
    /// Renders the directive as an NSIS statement.
    pub fn to_nsis(&self) -> String {
        match self {
            InstallerDirective::SetOutputDir(dir) => {
                format!("SetOutPath \"{}\"", install_path(dir))
            }
            InstallerDirective::InstallFile(file) => {
                format!("File \"{}\"", windows_path(file))
            }
            InstallerDirective::DeleteFile(file) => {
                format!("Delete \"{}\"", install_path(file))
            }
            InstallerDirective::RemoveDir(dir) => format!("RMDir \"{}\"", install_path(dir)),
        }
    }
}

/// Staged destinations that are installed: regular files whose source was
/// actually staged.
pub fn installable_files(tree: &StagedTree) -> Vec<PathBuf> {
    tree.entries()
        .iter()
        .filter(|entry| !entry.source.as_os_str().is_empty())
        .filter(|entry| entry.destination.is_file())
        .map(|entry| entry.destination.clone())
        .collect()
}

/// Directives that install `files` (all under `root`).
pub fn install_directives(files: &[PathBuf], root: &Path) -> Result<Vec<InstallerDirective>> {
    let mut directives = Vec::new();
    let mut out_dir: Option<PathBuf> = None;

    for (relative, staged) in sorted_relative(files, root)? {
        let dir = relative.parent().map(Path::to_path_buf).unwrap_or_default();
        if out_dir.as_ref() != Some(&dir) {
            directives.push(InstallerDirective::SetOutputDir(dir.clone()));
            out_dir = Some(dir);
        }
        directives.push(InstallerDirective::InstallFile(staged));
    }
    Ok(directives)
}

/// Directives that remove what [`install_directives`] installs.
pub fn uninstall_directives(files: &[PathBuf], root: &Path) -> Result<Vec<InstallerDirective>> {
    let sorted = sorted_relative(files, root)?;

    let mut dirs = BTreeSet::new();
    for (relative, _) in &sorted {
        let mut current = relative.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.insert((depth(dir), windows_path(dir), dir.to_path_buf()));
            current = dir.parent();
        }
    }

    let mut directives: Vec<InstallerDirective> = sorted
        .into_iter()
        .map(|(relative, _)| InstallerDirective::DeleteFile(relative))
        .collect();
    directives.extend(
        dirs.into_iter()
            .rev()
            .map(|(_, _, dir)| InstallerDirective::RemoveDir(dir)),
    );
    Ok(directives)
}

/// Renders directives one per line.
pub fn render(directives: &[InstallerDirective]) -> String {
    directives
        .iter()
        .map(InstallerDirective::to_nsis)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(relative, staged)` pairs, deduplicated and sorted deepest first.
///
/// Ties within one depth order by the backslash-separated path string, so
/// `a-b\x` and `a\x` compare byte-wise rather than component-wise.
fn sorted_relative(files: &[PathBuf], root: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut keyed = BTreeSet::new();
    for file in files {
        let relative = normalize(file.strip_prefix(root)?);
        keyed.insert((depth(&relative), windows_path(&relative), relative, file.clone()));
    }
    Ok(keyed
        .into_iter()
        .rev()
        .map(|(_, _, relative, staged)| (relative, staged))
        .collect())
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn windows_path(path: &Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}

fn install_path(relative: &Path) -> String {
    if relative.as_os_str().is_empty() {
        "$INSTDIR".to_string()
    } else {
        format!("$INSTDIR\\{}", windows_path(relative))
    }
}

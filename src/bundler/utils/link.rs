//! Relative path resolution and self-healing symlink creation.
//!
//! Links produced here are always relative to their own location so the
//! finished tree can be copied into a disk image or archive unchanged.

use crate::bundler::error::{Error, ErrorExt, Result};
use path_absolutize::Absolutize;
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Upper bound on hops followed when checking a link chain.
const MAX_LINK_HOPS: usize = 40;

/// How a link failure is handled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkPolicy {
    /// Log the failure and carry on. For cosmetic links.
    Lenient,
    /// Propagate the failure as [`Error::Link`].
    Strict,
}

/// A symlink that exists on disk with the intended relative target.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymlinkRecord {
    /// Path of the link itself.
    pub link: PathBuf,
    /// Relative target stored in the link.
    pub target: PathBuf,
}

/// Returns the relative path from `base` to `path`.
///
/// With `preserve_symlinks` unset both inputs are fully dereferenced first,
/// giving the physical relation. With it set neither is dereferenced, which
/// keeps a symlinked `path` as the hop the caller points at.
pub fn resolve_relative(path: &Path, base: &Path, preserve_symlinks: bool) -> Result<PathBuf> {
    let (path, base) = if preserve_symlinks {
        (lexical_path(path)?, lexical_path(base)?)
    } else {
        (physical_path(path)?, physical_path(base)?)
    };
    Ok(diff_paths(&path, &base))
}

/// Absolute path without touching symlinks.
fn lexical_path(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("absolutizing", path)?
        .into_owned())
}

/// Fully dereferenced absolute path.
///
/// Trailing components that do not exist yet are appended to the
/// dereferenced longest existing ancestor.
fn physical_path(path: &Path) -> Result<PathBuf> {
    let absolute = lexical_path(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();

    loop {
        match std::fs::canonicalize(existing) {
            Ok(mut resolved) => {
                for component in missing.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Ok(absolute);
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(e) => return Err(e).fs_context("resolving", existing),
        }
    }
}

/// Component-wise difference of two absolute, normalized paths.
fn diff_paths(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Creates `link` pointing at the relative `target`, repairing collisions.
///
/// - nothing at `link`: the parent is created and the link made
/// - a symlink whose stored target equals `target`: nothing to do
/// - a symlink elsewhere, a directory or a plain file: removed, then linked
///
/// Absolute targets are always rejected. Other failures are logged and
/// swallowed under [`LinkPolicy::Lenient`], in which case `Ok(None)` is
/// returned.
pub fn symlink_relative(
    target: &Path,
    link: &Path,
    policy: LinkPolicy,
) -> Result<Option<SymlinkRecord>> {
    if target.is_absolute() {
        return Err(Error::Link {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            reason: "link targets must be relative".to_string(),
        });
    }

    match place_link(target, link) {
        Ok(()) => Ok(Some(SymlinkRecord {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
        })),
        Err(e) => tolerate(
            Error::Link {
                link: link.to_path_buf(),
                target: target.to_path_buf(),
                reason: e.to_string(),
            },
            policy,
        ),
    }
}

/// Swallows a cosmetic failure under [`LinkPolicy::Lenient`].
fn tolerate(error: Error, policy: LinkPolicy) -> Result<Option<SymlinkRecord>> {
    if policy == LinkPolicy::Lenient && error.is_cosmetic() {
        log::warn!("{}", error);
        return Ok(None);
    }
    Err(error)
}

fn place_link(target: &Path, link: &Path) -> io::Result<()> {
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match super::fs::symlink(target, link) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }

    let meta = std::fs::symlink_metadata(link)?;
    if meta.file_type().is_symlink() {
        if std::fs::read_link(link)? == target {
            log::debug!("{} already links to {}", link.display(), target.display());
            return Ok(());
        }
        log::debug!("Replacing stale link {}", link.display());
        remove_link(link)?;
    } else if meta.is_dir() {
        log::debug!("Replacing directory {} with a link", link.display());
        std::fs::remove_dir_all(link)?;
    } else {
        log::debug!("Replacing file {} with a link", link.display());
        std::fs::remove_file(link)?;
    }

    super::fs::symlink(target, link)
}

#[cfg(unix)]
fn remove_link(link: &Path) -> io::Result<()> {
    std::fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> io::Result<()> {
    std::fs::remove_file(link).or_else(|_| std::fs::remove_dir(link))
}

/// Links `link` to the absolute `target`, storing the path relative to the
/// link's directory.
///
/// `preserve_symlinks` is forwarded to [`resolve_relative`]: set it when
/// `target` is itself a link that should remain the next hop. A path that
/// cannot be resolved is a link failure and follows `policy`.
pub fn link_to(
    target: &Path,
    link: &Path,
    preserve_symlinks: bool,
    policy: LinkPolicy,
) -> Result<Option<SymlinkRecord>> {
    let link_dir = link.parent().unwrap_or_else(|| Path::new("."));
    let relative = match resolve_relative(target, link_dir, preserve_symlinks) {
        Ok(relative) => relative,
        Err(e) => {
            return tolerate(
                Error::Link {
                    link: link.to_path_buf(),
                    target: target.to_path_buf(),
                    reason: e.to_string(),
                },
                policy,
            );
        }
    };
    symlink_relative(&relative, link, policy)
}

/// Follows the chain of hops starting at `link` and returns every hop.
///
/// Fails with [`Error::Link`] when a hop resolves onto the link itself or any
/// of its ancestor directories, or when a hop repeats.
pub fn check_link_chain(link: &Path) -> Result<Vec<PathBuf>> {
    let start = lexical_path(link)?;
    let ancestors: Vec<PathBuf> = start.ancestors().map(Path::to_path_buf).collect();
    let cycle = |target: &Path, reason: &str| Error::Link {
        link: start.clone(),
        target: target.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut visited = HashSet::new();
    let mut hops = Vec::new();
    let mut current = start.clone();

    while std::fs::symlink_metadata(&current)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
    {
        if hops.len() >= MAX_LINK_HOPS {
            return Err(cycle(&current, "too many link hops"));
        }
        let stored = std::fs::read_link(&current).fs_context("reading link", &current)?;
        let parent = current.parent().unwrap_or_else(|| Path::new("/"));
        let next = lexical_path(&parent.join(stored))?;

        if ancestors.contains(&next) {
            return Err(cycle(&next, "link resolves onto its own ancestor"));
        }
        if !visited.insert(next.clone()) {
            return Err(cycle(&next, "link chain revisits a hop"));
        }
        hops.push(next.clone());
        current = next;
    }

    // A hop may pass through a symlinked directory; compare physical paths too.
    if let (Ok(resolved), Some(parent)) = (std::fs::canonicalize(&start), start.parent()) {
        if let Ok(parent) = std::fs::canonicalize(parent) {
            if parent.starts_with(&resolved) {
                return Err(cycle(&resolved, "link resolves onto its own ancestor"));
            }
        }
    }

    Ok(hops)
}

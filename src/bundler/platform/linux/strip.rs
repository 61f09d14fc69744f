//! Debug symbol stripping of the packaged binaries.

use crate::bundler::{
    error::{Error, Result},
    settings::LinuxSettings,
    utils::process,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Regular files under the strip directories whose names match no exclusion.
pub fn strip_candidates(root: &Path, linux: &LinuxSettings) -> Result<Vec<PathBuf>> {
    let exclusions = linux
        .strip_exclude
        .iter()
        .map(|pattern| glob::Pattern::new(pattern))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut candidates = Vec::new();
    for dir in &linux.strip_dirs {
        let dir = root.join(dir);
        if !dir.is_dir() {
            log::debug!("Skipping strip of {} (absent)", dir.display());
            continue;
        }
        for entry in walkdir::WalkDir::new(&dir).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if exclusions.iter().any(|pattern| pattern.matches(&name)) {
                continue;
            }
            candidates.push(entry.into_path());
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Runs `strip -S` on every candidate.
pub async fn strip_binaries(root: &Path, linux: &LinuxSettings) -> Result<usize> {
    let candidates = strip_candidates(root, linux)?;
    log::info!("Stripping {} packaged file(s)", candidates.len());
    for file in &candidates {
        process::run_tool("strip", "strip", [OsStr::new("-S"), file.as_os_str()])
            .await
            .map_err(|e| match e {
                Error::ExternalTool { command, status, stderr, .. } => Error::ExternalTool {
                    stage: format!("strip {}", file.display()),
                    command,
                    status,
                    stderr,
                },
                other => other,
            })?;
    }
    Ok(candidates.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_names_are_not_stripped() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = tmp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("do-not-run-directly"), b"elf").unwrap();
        std::fs::write(bin.join("launcher.py"), b"py").unwrap();
        std::fs::write(bin.join("update_install"), b"sh").unwrap();
        std::fs::create_dir_all(tmp.path().join("lib")).unwrap();
        std::fs::write(tmp.path().join("lib/libfoo.so"), b"elf").unwrap();
        std::fs::write(tmp.path().join("readme.txt"), b"outside").unwrap();

        let found = strip_candidates(tmp.path(), &LinuxSettings::default()).unwrap();
        assert_eq!(
            found,
            vec![bin.join("do-not-run-directly"), tmp.path().join("lib/libfoo.so")]
        );
    }
}

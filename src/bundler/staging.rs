//! The staged file tree handed over by the staging collaborator.
//!
//! Staging itself (pattern based inclusion, copying) happens upstream. What
//! arrives here is an ordered list of `(source, destination)` pairs plus the
//! destination root they were copied under.

use crate::bundler::{
    Error,
    error::{ErrorExt, Result},
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One staged `(source, destination)` pair.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
pub struct StagedFileEntry {
    /// Where the file came from. May no longer exist.
    pub source: PathBuf,
    /// Where the file lives in the staged tree. Unique across the list.
    pub destination: PathBuf,
}

impl StagedFileEntry {
    /// Creates an entry.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// The staged destination tree and its file list.
#[derive(Clone, Debug)]
pub struct StagedTree {
    root: PathBuf,
    entries: Vec<StagedFileEntry>,
}

impl StagedTree {
    /// Creates a tree from a root and its entries.
    ///
    /// Later duplicates of a destination are dropped, keeping the first pair.
    pub fn new(root: impl Into<PathBuf>, entries: Vec<StagedFileEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.destination.clone()))
            .collect();
        Self {
            root: root.into(),
            entries,
        }
    }

    /// Loads a JSON file list of `[source, destination]` pairs.
    ///
    /// Relative destinations are resolved against `root`.
    pub async fn load(root: impl Into<PathBuf>, file_list: &Path) -> Result<Self> {
        let root = root.into();
        let content = tokio::fs::read_to_string(file_list)
            .await
            .fs_context("reading staged file list", file_list)?;
        let pairs: Vec<(PathBuf, PathBuf)> = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!(
                "invalid staged file list {}: {}",
                file_list.display(),
                e
            ))
        })?;

        let entries = pairs
            .into_iter()
            .map(|(source, destination)| {
                let destination = if destination.is_absolute() {
                    destination
                } else {
                    root.join(destination)
                };
                StagedFileEntry::new(source, destination)
            })
            .collect();

        log::debug!("Loaded staged file list {}", file_list.display());
        Ok(Self::new(root, entries))
    }

    /// The destination root ("current destination root").
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All entries in staging order.
    pub fn entries(&self) -> &[StagedFileEntry] {
        &self.entries
    }

    /// Resolves a path relative to the destination root.
    pub fn path_of(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Returns the staged path, or [`Error::MissingResource`] when absent.
    pub fn require(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.path_of(relative);
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::MissingResource { path })
        }
    }

    /// Expands a glob pattern relative to `dir` inside the tree.
    ///
    /// Returns the matching paths, or an empty list with a skip notice when
    /// nothing matches. The caller decides whether an empty result is fatal.
    pub fn optional(&self, dir: impl AsRef<Path>, pattern: &str) -> Result<Vec<PathBuf>> {
        let base = self.path_of(dir);
        let full = base.join(pattern);
        let full = full.to_str().ok_or_else(|| {
            Error::Configuration(format!("non UTF-8 pattern {}", full.display()))
        })?;

        let escaped_base = glob::Pattern::escape(&base.to_string_lossy());
        let pattern_str = format!("{}/{}", escaped_base, pattern);
        let mut matches: Vec<PathBuf> = glob::glob(&pattern_str)?
            .filter_map(|entry| entry.ok())
            .collect();
        matches.sort();

        if matches.is_empty() {
            log::info!("Skipping {} (not staged)", full);
        }
        Ok(matches)
    }
}

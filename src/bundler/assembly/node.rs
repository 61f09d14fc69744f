//! The nested bundle tree.

use crate::bundler::settings::{NestedBundleSettings, Settings};
use std::path::{Path, PathBuf};

/// One logical application bundle inside the staged tree.
#[derive(Clone, Debug)]
pub struct BundleNode {
    /// Bundle directory name, e.g. `SLPlugin.app`.
    pub name: String,
    /// Absolute path of the bundle in the staged tree.
    pub path: PathBuf,
    /// Where the bundle is copied from, if it is not staged already.
    pub source: Option<PathBuf>,
    /// Where this bundle's link to the shared resource goes.
    ///
    /// `None` for the top-level bundle, which holds the physical copy, and
    /// for bundles that do not depend on the shared resource.
    pub shared_link: Option<PathBuf>,
    /// Directory receiving shared library links.
    pub library_dir: Option<PathBuf>,
    /// Bundles nested inside this one.
    pub children: Vec<BundleNode>,
}

impl BundleNode {
    /// Builds the tree for the configured application bundle.
    pub fn from_settings(settings: &Settings) -> Self {
        let macos = &settings.bundle_settings().macos;
        let path = settings.app_bundle_path();
        let children_dir = path.join(&macos.children_dir);
        let shared_name = macos.shared_resource.as_ref().map(|s| s.name.as_str());

        let children = macos
            .bundles
            .iter()
            .map(|child| Self::nested(&children_dir, child, shared_name, settings.source_root()))
            .collect();

        Self {
            name: format!("{}.app", settings.app_name()),
            path,
            source: None,
            shared_link: None,
            library_dir: None,
            children,
        }
    }

    fn nested(
        parent_dir: &Path,
        config: &NestedBundleSettings,
        shared_name: Option<&str>,
        source_root: &Path,
    ) -> Self {
        let path = parent_dir.join(&config.name);
        let shared_link = match shared_name {
            Some(name) if config.depends_on_shared => Some(path.join(&config.shared_dir).join(name)),
            _ => None,
        };
        let children_dir = path.join(&config.children_dir);
        let children = config
            .children
            .iter()
            .map(|child| Self::nested(&children_dir, child, shared_name, source_root))
            .collect();

        Self {
            name: config.name.clone(),
            source: config.source.as_ref().map(|s| source_root.join(s)),
            shared_link,
            library_dir: config.library_dir.as_ref().map(|dir| path.join(dir)),
            path,
            children,
        }
    }

    /// Visits every node top-down with its depth (0 for the top bundle).
    pub fn walk(&self) -> Vec<(usize, &BundleNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

//! Nested bundle assembly with a deduplicated shared resource.
//!
//! The shared resource (typically a large embedded framework) is copied
//! physically once, into the top-level bundle. Every nested bundle that
//! depends on it receives a relative symlink instead. Bundles two or more
//! levels deep link to their parent's link rather than to the physical copy,
//! so each hop stays short and the chain never passes through an ancestor of
//! the link.
//!
//! # Process
//!
//! 1. Copy the shared resource into the top-level bundle (replacing any
//!    previous copy)
//! 2. Walk the bundle tree top-down, copying nested bundles that have a
//!    source and linking each dependent bundle to its nearest ancestor's
//!    shared resource
//! 3. Link present shared libraries into bundles that request them
//!
//! Re-running assembly over an already assembled tree repairs stale links and
//! never produces a second physical copy.

mod node;

pub use node::BundleNode;

use crate::bundler::{
    Error, Result,
    settings::Settings,
    staging::StagedTree,
    utils::{
        fs,
        link::{self, LinkPolicy, SymlinkRecord},
    },
};
use std::path::{Path, PathBuf};

/// What an assembly run produced.
#[derive(Debug, Default)]
pub struct AssemblyReport {
    /// The single physical copy of the shared resource, if one is configured.
    pub shared_copy: Option<PathBuf>,
    /// Links to the shared resource, top-down.
    pub shared_links: Vec<SymlinkRecord>,
    /// Links to shared libraries that were created.
    pub library_links: Vec<SymlinkRecord>,
    /// Every bundle in the tree, top-down.
    pub bundles: Vec<PathBuf>,
}

/// Assembles the nested bundle tree of the application bundle.
pub struct BundleAssembler<'a> {
    settings: &'a Settings,
    tree: &'a StagedTree,
}

impl<'a> BundleAssembler<'a> {
    /// Creates an assembler over the staged tree.
    pub fn new(settings: &'a Settings, tree: &'a StagedTree) -> Self {
        Self { settings, tree }
    }

    /// The bundle tree this assembler works on.
    pub fn plan(&self) -> BundleNode {
        BundleNode::from_settings(self.settings)
    }

    /// Runs assembly and returns what was produced.
    pub async fn assemble(&self) -> Result<AssemblyReport> {
        let root = self.plan();
        if !root.path.is_dir() {
            return Err(Error::MissingResource { path: root.path });
        }
        log::info!("Assembling {}", root.path.display());

        let mut report = AssemblyReport {
            shared_copy: self.copy_shared_resource(&root).await?,
            ..Default::default()
        };

        // (node, path its shared link should point at, whether that path is a link)
        let mut stack: Vec<(&BundleNode, Option<(PathBuf, bool)>)> =
            vec![(&root, report.shared_copy.clone().map(|p| (p, false)))];

        while let Some((node, parent_ref)) = stack.pop() {
            report.bundles.push(node.path.clone());

            if let Some(source) = &node.source {
                log::debug!("Copying bundle {} from {}", node.name, source.display());
                fs::replace_with_copy(source, &node.path).await?;
            }

            let mut own_ref = parent_ref.clone();
            if let (Some(link_path), Some((target, target_is_link))) = (&node.shared_link, &parent_ref) {
                let record = link::link_to(target, link_path, *target_is_link, LinkPolicy::Strict)?;
                link::check_link_chain(link_path)?;
                if let Some(record) = record {
                    log::debug!(
                        "Linked {} -> {}",
                        record.link.display(),
                        record.target.display()
                    );
                    report.shared_links.push(record);
                }
                own_ref = Some((link_path.clone(), true));
            }

            for child in node.children.iter().rev() {
                stack.push((child, own_ref.clone()));
            }
        }

        report.library_links = self.link_libraries(&root)?;

        log::info!(
            "✓ Assembled {} bundle(s), {} shared link(s)",
            report.bundles.len(),
            report.shared_links.len()
        );
        Ok(report)
    }

    /// Copies the shared resource into the top-level bundle exactly once.
    async fn copy_shared_resource(&self, root: &BundleNode) -> Result<Option<PathBuf>> {
        let Some(shared) = &self.settings.bundle_settings().macos.shared_resource else {
            return Ok(None);
        };

        let source = self.settings.source_path_of(&shared.source);
        let destination = root.path.join(&shared.dir).join(&shared.name);

        if source.exists() {
            log::info!("Copying shared resource {}", shared.name);
            fs::replace_with_copy(&source, &destination).await?;
        } else if destination.exists() {
            log::debug!(
                "Shared resource source {} absent, keeping staged copy",
                source.display()
            );
        } else {
            return Err(Error::MissingResource { path: source });
        }

        Ok(Some(destination))
    }

    /// Links every present shared library into bundles with a library dir.
    fn link_libraries(&self, root: &BundleNode) -> Result<Vec<SymlinkRecord>> {
        let macos = &self.settings.bundle_settings().macos;
        let library_dir = root.path.join(&macos.library_dir);

        let mut libraries = Vec::new();
        for library in &macos.libraries {
            let matches = self.tree.optional(&library_dir, &library.pattern)?;
            if matches.is_empty() && !library.optional {
                return Err(Error::MissingResource {
                    path: library_dir.join(&library.pattern),
                });
            }
            libraries.extend(matches);
        }

        let mut records = Vec::new();
        for (_, node) in root.walk() {
            let Some(dir) = &node.library_dir else {
                continue;
            };
            for library in &libraries {
                if let Some(record) = link_into(library, dir)? {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

fn link_into(library: &Path, dir: &Path) -> Result<Option<SymlinkRecord>> {
    let Some(name) = library.file_name() else {
        return Ok(None);
    };
    link::link_to(library, &dir.join(name), false, LinkPolicy::Lenient)
}

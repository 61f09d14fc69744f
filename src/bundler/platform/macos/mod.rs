//! macOS finalization: bundle assembly, relinking and the disk image.

pub mod dmg;
pub mod relink;
pub mod signing;

use crate::bundler::{
    assembly::BundleAssembler, error::Result, settings::Settings, staging::StagedTree,
};
use std::path::PathBuf;

/// Finalizes the staged app bundle into a DMG.
///
/// Assembly and relinking happen on the staged tree; signing happens later
/// on the copy inside the mounted image.
pub async fn bundle_project(settings: &Settings, tree: &StagedTree) -> Result<Vec<PathBuf>> {
    let assembler = BundleAssembler::new(settings, tree);
    assembler.assemble().await?;

    let directives = relink::plan_relinks(settings, &assembler.plan())?;
    relink::apply_relinks(&relink::InstallNameTool, &directives).await?;

    dmg::bundle_project(settings).await
}

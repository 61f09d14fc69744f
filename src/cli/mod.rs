//! Command line interface for the finalizer.

mod args;

pub use args::Args;

use crate::bundler::{Bundler, FinalizeOptions};
use crate::error::{CliError, Result};
use crate::manifest::{ManifestOverrides, PackagingManifest};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(&args).await
}

/// Runs a finalization for already parsed arguments.
///
/// Returns 0 only when the artifact exists.
pub async fn execute(args: &Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let manifest = PackagingManifest::load(&args.manifest).await?;
    let overrides = ManifestOverrides {
        output_dir: args.output_dir.clone(),
        file_list: args.file_list.clone(),
    };
    let settings = manifest.settings(&overrides)?;
    let tree = manifest.staged_tree(&overrides).await?;

    let options = FinalizeOptions {
        skip_archive: args.skip_archive,
        scripts_only: args.dry_run_scripts,
    };
    let artifact = Bundler::new(settings, tree)?
        .with_options(options)
        .finalize()
        .await?;

    for path in &artifact.paths {
        println!("{}", path.display());
    }
    println!("SHA256: {}", artifact.checksum);
    Ok(0)
}

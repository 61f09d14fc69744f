//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Packaging finalizer for staged build trees
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_finalize",
    version,
    about = "Packaging finalizer for staged build trees",
    long_about = "Turns a staged build tree into one distributable artifact: a signed .dmg on macOS,
an NSIS _Setup.exe on Windows, or a .tar.gz on Linux.

Usage:
  kodegen_bundler_finalize --manifest packaging.toml
  kodegen_bundler_finalize --manifest packaging.toml --file-list staged.json --output-dir dist
  kodegen_bundler_finalize --manifest packaging.toml --dry-run-scripts

Exit code 0 = artifact guaranteed to exist at the reported path."
)]
pub struct Args {
    /// Packaging manifest (TOML)
    #[arg(short = 'm', long, value_name = "PATH")]
    pub manifest: PathBuf,

    /// JSON list of [source, destination] pairs written by staging
    ///
    /// Overrides `paths.file_list` from the manifest.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file_list: Option<PathBuf>,

    /// Directory receiving the artifact
    ///
    /// Overrides `paths.output_dir` from the manifest.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Leave the normalized Linux tree in place instead of archiving it
    #[arg(long)]
    pub skip_archive: bool,

    /// Only render the installer script; run no external tools
    #[arg(long)]
    pub dry_run_scripts: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.manifest.is_file() {
            return Err(format!("Manifest {} not found", self.manifest.display()));
        }
        if let Some(list) = &self.file_list {
            if !list.is_file() {
                return Err(format!("File list {} not found", list.display()));
            }
        }
        if self.skip_archive && self.dry_run_scripts {
            return Err("--skip-archive and --dry-run-scripts cannot be combined".to_string());
        }
        Ok(())
    }
}

//! Rewriting of compiled binaries' references to the shared resource.
//!
//! Binaries are built against a fixed reference to the shared framework.
//! Once the bundle tree is assembled each configured binary gets that
//! reference rewritten to `@executable_path/<relative path>/<binary>`,
//! computed from where the binary actually runs.
//!
//! Must run after assembly (the links it points through must exist) and
//! before signing (a rewrite invalidates a signature).

use crate::bundler::{
    assembly::BundleNode,
    error::{Error, ErrorExt, Result},
    settings::{RelinkSettings, Settings},
    utils::{link, process},
};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One reference rewrite.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelinkDirective {
    /// Binary to rewrite.
    pub binary: PathBuf,
    /// Reference recorded at build time.
    pub old_reference: String,
    /// Reference relative to the binary's runtime directory.
    pub new_reference: String,
}

/// The reference-rewrite primitive.
#[allow(async_fn_in_trait)]
pub trait ReferenceRewriter {
    /// Rewrites `old_reference` to `new_reference` inside `binary`.
    async fn rewrite(&self, directive: &RelinkDirective) -> Result<()>;
}

/// Rewrites references with `install_name_tool -change`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstallNameTool;

impl ReferenceRewriter for InstallNameTool {
    async fn rewrite(&self, directive: &RelinkDirective) -> Result<()> {
        process::run_tool(
            "relink",
            "install_name_tool",
            [
                OsStr::new("-change"),
                OsStr::new(&directive.old_reference),
                OsStr::new(&directive.new_reference),
                directive.binary.as_os_str(),
            ],
        )
        .await
        .map(|_| ())
    }
}

/// Computes the relink directives for every configured binary.
///
/// Each `(binary, old reference)` pair appears at most once.
pub fn plan_relinks(settings: &Settings, bundles: &BundleNode) -> Result<Vec<RelinkDirective>> {
    let macos = &settings.bundle_settings().macos;
    let Some(shared) = &macos.shared_resource else {
        if !macos.relink.is_empty() {
            return Err(Error::Configuration(
                "relink entries require a shared_resource".to_string(),
            ));
        }
        return Ok(Vec::new());
    };

    let app = settings.app_bundle_path();
    let physical = app.join(&shared.dir).join(&shared.name);
    let binary_name = shared.binary_name();

    let old_reference = match &shared.old_reference {
        Some(reference) => reference.clone(),
        None => read_install_name(&physical.join(&binary_name))?,
    };

    let mut seen = HashSet::new();
    let mut directives = Vec::new();
    for entry in &macos.relink {
        let binary = app.join(&entry.binary);
        if !binary.is_file() {
            return Err(Error::MissingResource { path: binary });
        }
        if !seen.insert((binary.clone(), old_reference.clone())) {
            log::debug!("{} already planned for relinking", binary.display());
            continue;
        }

        let (target, through_link) = shared_target_for(entry, bundles, &physical)?;
        let anchor = match &entry.anchor {
            Some(anchor) => app.join(anchor),
            None => binary
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| app.clone()),
        };
        let relative = link::resolve_relative(&target, &anchor, through_link)?;

        directives.push(RelinkDirective {
            new_reference: format!(
                "@executable_path/{}/{}",
                relative.to_string_lossy().replace('\\', "/"),
                binary_name
            ),
            old_reference: old_reference.clone(),
            binary,
        });
    }
    Ok(directives)
}

/// Where a binary should find the shared resource, and whether that path is
/// a link that must not be dereferenced.
fn shared_target_for(
    entry: &RelinkSettings,
    bundles: &BundleNode,
    physical: &Path,
) -> Result<(PathBuf, bool)> {
    let Some(bundle) = &entry.bundle else {
        return Ok((physical.to_path_buf(), false));
    };
    bundles
        .walk()
        .into_iter()
        .find(|(_, node)| &node.name == bundle)
        .and_then(|(_, node)| node.shared_link.clone())
        .map(|link| (link, true))
        .ok_or_else(|| {
            Error::Configuration(format!(
                "relink of {} names bundle {} which has no shared resource link",
                entry.binary.display(),
                bundle
            ))
        })
}

/// Applies directives in order. Any failure aborts the run.
pub async fn apply_relinks<R: ReferenceRewriter>(
    rewriter: &R,
    directives: &[RelinkDirective],
) -> Result<()> {
    for directive in directives {
        log::info!(
            "Relinking {}: {} -> {}",
            directive.binary.display(),
            directive.old_reference,
            directive.new_reference
        );
        rewriter
            .rewrite(directive)
            .await
            .map_err(|e| Error::Relink {
                binary: directive.binary.clone(),
                old_reference: directive.old_reference.clone(),
                new_reference: directive.new_reference.clone(),
                reason: e.to_string(),
            })?;
    }
    if !directives.is_empty() {
        log::info!("✓ Relinked {} binar(ies)", directives.len());
    }
    Ok(())
}

/// Reads the install name (`LC_ID_DYLIB`) of a Mach-O dylib.
///
/// For universal binaries the first architecture is used; every slice
/// carries the same install name.
pub fn read_install_name(dylib: &Path) -> Result<String> {
    let buffer = std::fs::read(dylib).fs_context("reading shared resource binary", dylib)?;

    let parse_error = |e: goblin::error::Error| {
        Error::Configuration(format!("cannot parse {}: {}", dylib.display(), e))
    };
    let name = match goblin::mach::Mach::parse(&buffer).map_err(parse_error)? {
        goblin::mach::Mach::Binary(macho) => macho.name.map(str::to_string),
        goblin::mach::Mach::Fat(fat) => match fat.get(0).map_err(parse_error)? {
            goblin::mach::SingleArch::MachO(macho) => macho.name.map(str::to_string),
            goblin::mach::SingleArch::Archive(_) => None,
        },
    };

    name.ok_or_else(|| {
        Error::Configuration(format!(
            "{} has no install name; set shared_resource.old_reference",
            dylib.display()
        ))
    })
}

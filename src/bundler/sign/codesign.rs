//! Apple `codesign` signer plus the keychain, Gatekeeper and notarization
//! steps that surround it.

use super::{CodeSigner, SignMode, SignOutcome, SignRequest};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    utils::process,
};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Identity used when the configured one is empty.
pub const DEFAULT_IDENTITY: &str = "Developer ID Application";

/// Output fragments that no retry can fix.
const FATAL_MARKERS: &[&str] = &[
    "no identity found",
    "the specified item could not be found in the keychain",
    "ambiguous",
    "entitlements",
    "no such file or directory",
    "is not signed at all",
    "bundle format unrecognized",
];

/// Signs with `codesign`.
#[derive(Clone, Debug)]
pub struct Codesign {
    identity: String,
    keychain: Option<PathBuf>,
    entitlements: Option<PathBuf>,
}

impl Codesign {
    /// Creates a signer. An empty identity selects [`DEFAULT_IDENTITY`].
    pub fn new(identity: &str, keychain: Option<PathBuf>, entitlements: Option<PathBuf>) -> Self {
        let identity = if identity.trim().is_empty() {
            DEFAULT_IDENTITY.to_string()
        } else {
            identity.to_string()
        };
        Self {
            identity,
            keychain,
            entitlements,
        }
    }

    /// The identity passed to `--sign`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Arguments for one request.
    pub fn arguments(&self, request: &SignRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match request.mode {
            SignMode::Plain => {
                args.extend(["--force", "--timestamp"].map(OsString::from));
            }
            SignMode::Deep => {
                args.extend(["--verbose", "--deep", "--force"].map(OsString::from));
                if let Some(entitlements) = &self.entitlements {
                    args.push("--entitlements".into());
                    args.push(entitlements.into());
                }
                args.extend(["--options", "runtime"].map(OsString::from));
            }
        }
        if let Some(keychain) = &self.keychain {
            args.push("--keychain".into());
            args.push(keychain.into());
        }
        args.push("--sign".into());
        args.push(self.identity.clone().into());
        args.push(request.target.clone().into());
        args
    }
}

impl CodeSigner for Codesign {
    async fn sign(&self, request: &SignRequest) -> SignOutcome {
        match process::run_tool("sign", "codesign", self.arguments(request)).await {
            Ok(_) => SignOutcome::Success,
            Err(Error::ExternalTool { stderr, .. }) => classify(&stderr),
            Err(e) => SignOutcome::FatalFailure(e.to_string()),
        }
    }
}

/// Sorts `codesign` failure output into fatal and transient.
///
/// Anything not recognised as fatal is retried.
pub(crate) fn classify(stderr: &str) -> SignOutcome {
    let lowered = stderr.to_lowercase();
    if FATAL_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        SignOutcome::FatalFailure(stderr.to_string())
    } else {
        SignOutcome::TransientFailure(stderr.to_string())
    }
}

/// Unlocks `keychain` with the first line of `password_file`.
///
/// The password never appears in logs or error messages.
pub async fn unlock_keychain(keychain: &Path, password_file: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(password_file)
        .await
        .fs_context("reading keychain password", password_file)?;
    let password = content.lines().next().unwrap_or_default().trim_end();

    log::info!("Unlocking keychain {}", keychain.display());
    let output = tokio::process::Command::new("security")
        .arg("unlock-keychain")
        .arg("-p")
        .arg(password)
        .arg(keychain)
        .output()
        .await
        .map_err(|error| Error::CommandFailed {
            command: "security".to_string(),
            error,
        })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            stage: "sign".to_string(),
            command: format!("security unlock-keychain -p *** {}", keychain.display()),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Runs the Gatekeeper assessment against a signed bundle.
pub async fn verify_gatekeeper(bundle: &Path) -> Result<()> {
    log::info!("Verifying {}", bundle.display());
    let output = process::run_tool(
        "verify",
        "spctl",
        [OsStr::new("-a"), OsStr::new("-texec"), OsStr::new("-vvvv"), bundle.as_os_str()],
    )
    .await?;
    log::debug!("{}", String::from_utf8_lossy(&output.stderr).trim());
    log::info!("✓ Gatekeeper accepted {}", bundle.display());
    Ok(())
}

/// Runs the notarization script against a signed bundle.
pub async fn notarize(script: &Path, bundle: &Path) -> Result<()> {
    log::info!("Notarizing {}", bundle.display());
    process::run_tool("notarize", script, [bundle]).await?;
    log::info!("✓ Notarized {}", bundle.display());
    Ok(())
}

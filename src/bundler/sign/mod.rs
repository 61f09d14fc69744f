//! Code signing with bounded retry.
//!
//! Signing tools fail intermittently (a busy timestamp service, keychain
//! lock contention). [`SigningPipeline`] retries those transient failures
//! with a doubling backoff and gives up after a fixed number of attempts.
//! Fatal failures (missing identity, malformed entitlements) abort at once.
//!
//! Targets are signed in plan order: every plain (shallow) target before any
//! deep one, since a bundle's seal covers its already signed contents.

mod codesign;
mod command;
mod pipeline;

pub use codesign::{Codesign, notarize, unlock_keychain, verify_gatekeeper};
pub use command::CommandSigner;
pub use pipeline::{MAX_SIGN_ATTEMPTS, RetryPolicy, SigningAttempt, SigningPipeline};

use std::path::PathBuf;

/// How a target is signed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignMode {
    /// Only the target itself.
    Plain,
    /// The target and the nested code it contains, with entitlements and
    /// the hardened runtime.
    Deep,
}

/// One target handed to a signer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignRequest {
    /// File or bundle to sign.
    pub target: PathBuf,
    /// Signing mode.
    pub mode: SignMode,
}

impl SignRequest {
    /// A plain signing request.
    pub fn plain(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            mode: SignMode::Plain,
        }
    }

    /// A deep signing request.
    pub fn deep(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            mode: SignMode::Deep,
        }
    }
}

/// Result of a single signing attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignOutcome {
    /// The target is signed.
    Success,
    /// Worth retrying.
    TransientFailure(String),
    /// Retrying cannot help.
    FatalFailure(String),
}

/// A signing tool.
#[allow(async_fn_in_trait)]
pub trait CodeSigner {
    /// Makes one attempt at signing `request.target`.
    async fn sign(&self, request: &SignRequest) -> SignOutcome;
}

/// Ordered signing targets.
#[derive(Clone, Debug, Default)]
pub struct SignPlan {
    plain: Vec<PathBuf>,
    deep: Vec<PathBuf>,
}

impl SignPlan {
    /// An empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target signed shallowly.
    pub fn plain(mut self, target: impl Into<PathBuf>) -> Self {
        self.plain.push(target.into());
        self
    }

    /// Adds a target signed deeply.
    pub fn deep(mut self, target: impl Into<PathBuf>) -> Self {
        self.deep.push(target.into());
        self
    }

    /// Requests in signing order: all plain targets, then all deep ones.
    pub fn requests(&self) -> Vec<SignRequest> {
        self.plain
            .iter()
            .map(SignRequest::plain)
            .chain(self.deep.iter().map(SignRequest::deep))
            .collect()
    }
}

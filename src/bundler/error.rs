//! Error types for finalization stages.
//!
//! The variants mirror the failure classes of a packaging run: configuration
//! problems detected before any stage starts, missing staged resources, link
//! and relink failures, signing failures and external tool failures. The
//! remaining variants carry filesystem and template plumbing errors.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while finalizing a staged tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input is missing or invalid before packaging starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An expected staged file is absent.
    #[error("missing staged resource: {}", path.display())]
    MissingResource {
        /// Path that was expected in the staged tree
        path: PathBuf,
    },

    /// Symlink creation failed for a reason other than "already correct".
    #[error("can't symlink {} -> {}: {reason}", link.display(), target.display())]
    Link {
        /// Link path on disk
        link: PathBuf,
        /// Intended link target
        target: PathBuf,
        /// Why the link could not be created
        reason: String,
    },

    /// A binary reference rewrite failed.
    #[error("failed to relink {}: {old_reference} -> {new_reference}: {reason}", binary.display())]
    Relink {
        /// Binary being rewritten
        binary: PathBuf,
        /// Reference recorded at build time
        old_reference: String,
        /// Reference relative to the binary's final location
        new_reference: String,
        /// Why the rewrite failed
        reason: String,
    },

    /// Signing failed fatally or exhausted its retry budget.
    #[error("signing {} failed after {attempts} attempt(s): {reason}", target.display())]
    Signing {
        /// Signing target
        target: PathBuf,
        /// Number of attempts made
        attempts: u32,
        /// Output of the last failed attempt
        reason: String,
    },

    /// An external tool exited unsuccessfully.
    #[error("{stage}: `{command}` failed ({status}): {stderr}")]
    ExternalTool {
        /// Stage that invoked the tool
        stage: String,
        /// Command line, for reproduction
        command: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// An external tool could not be spawned.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Program name
        command: String,
        /// Spawn error
        error: io::Error,
    },

    /// Filesystem operation failed.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        error: io::Error,
    },

    /// IO error without path context.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Directory walk failed.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping failed.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Glob pattern was invalid.
    #[error("{0}")]
    GlobPattern(#[from] glob::PatternError),

    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(String),

    /// Error with additional context.
    #[error("{0}: {1}")]
    Context(String, Box<Error>),

    /// Catch-all error.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Whether this error is tolerated on a cosmetic path.
    ///
    /// Only link failures may be swallowed by lenient callers; everything else
    /// aborts the current platform's run.
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Error::Link { .. })
    }
}

/// Attaches a human readable context to a fallible value.
pub trait Context<T> {
    /// Adds a static context message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Adds a lazily built context message.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attaches filesystem context (operation + path) to IO results.
pub trait ErrorExt<T> {
    /// Wraps the IO error into [`Error::Fs`].
    fn fs_context(self, context: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &str, path: &Path) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.to_path_buf(),
            error,
        })
    }
}

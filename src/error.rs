//! Error types for the command-line surface.

use thiserror::Error;

/// Result type alias for command-line operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type of the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("manifest error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Finalization errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Process exit code for this error.
    ///
    /// Usage problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Cli(CliError::InvalidArguments { .. }) | BundlerError::Toml(_) => 2,
            _ => 1,
        }
    }
}

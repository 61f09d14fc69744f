//! Signing through a configured external command, used for Windows
//! executables.

use super::{CodeSigner, SignOutcome, SignRequest};
use crate::bundler::{error::Error, utils::process};
use std::ffi::OsString;
use std::path::PathBuf;

/// Runs `[interpreter] command <target>` for every request.
///
/// A non-zero exit is treated as transient; a command that cannot be
/// spawned is fatal.
#[derive(Clone, Debug)]
pub struct CommandSigner {
    command: PathBuf,
    interpreter: Option<PathBuf>,
}

impl CommandSigner {
    /// Creates a signer for `command`, optionally run by `interpreter`.
    pub fn new(command: impl Into<PathBuf>, interpreter: Option<PathBuf>) -> Self {
        Self {
            command: command.into(),
            interpreter,
        }
    }

    fn invocation(&self, request: &SignRequest) -> (OsString, Vec<OsString>) {
        let target = request.target.clone().into_os_string();
        match &self.interpreter {
            Some(interpreter) => (
                interpreter.clone().into_os_string(),
                vec![self.command.clone().into_os_string(), target],
            ),
            None => (self.command.clone().into_os_string(), vec![target]),
        }
    }
}

impl CodeSigner for CommandSigner {
    async fn sign(&self, request: &SignRequest) -> SignOutcome {
        let (program, args) = self.invocation(request);
        match process::run_tool("sign", program, args).await {
            Ok(_) => SignOutcome::Success,
            Err(Error::ExternalTool { stderr, status, .. }) => {
                SignOutcome::TransientFailure(format!("{}: {}", status, stderr))
            }
            Err(e) => SignOutcome::FatalFailure(e.to_string()),
        }
    }
}

//! External tool invocation.
//!
//! Every stage shells out through [`run_tool`] so a failing tool always
//! surfaces as [`Error::ExternalTool`] naming the stage, the command line and
//! the captured standard error.

use crate::bundler::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

/// Renders a command line for logs and error messages.
pub fn command_line<I, S>(program: impl AsRef<OsStr>, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut line = program.as_ref().to_string_lossy().into_owned();
    for arg in args {
        let arg = arg.as_ref().to_string_lossy();
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}

/// Runs `program` with `args`, capturing output.
///
/// Returns the output on success. A non-zero exit becomes
/// [`Error::ExternalTool`]; a spawn failure becomes [`Error::CommandFailed`].
pub async fn run_tool<I, S>(stage: &str, program: impl AsRef<OsStr>, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tool_in(stage, None, program, args).await
}

/// Like [`run_tool`], with an explicit working directory.
pub async fn run_tool_in<I, S>(
    stage: &str,
    cwd: Option<&Path>,
    program: impl AsRef<OsStr>,
    args: I,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let line = command_line(&program, &args);
    log::debug!("{}: running {}", stage, line);

    let mut command = tokio::process::Command::new(&program);
    command.args(&args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = command.output().await.map_err(|error| Error::CommandFailed {
        command: program.as_ref().to_string_lossy().into_owned(),
        error,
    })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            stage: stage.to_string(),
            command: line,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

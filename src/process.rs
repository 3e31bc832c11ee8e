//! External tool execution with captured output

use crate::error::{GenerateError, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

/// Captured result of a successful tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

/// Render a command line for messages, quoting arguments that contain spaces
#[must_use]
pub fn command_line<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> String {
    std::iter::once(program.as_os_str())
        .chain(args.iter().map(AsRef::as_ref))
        .map(|part| {
            let part = part.to_string_lossy();
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{part}\"")
            } else {
                part.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `program` with `args` in `cwd`, waiting for it to finish.
///
/// Both output streams are captured. A launch failure or a non-zero exit
/// becomes [`GenerateError::Toolchain`] carrying the command line, the exit
/// status and both streams.
pub async fn run_tool<S: AsRef<OsStr>>(program: &Path, args: &[S], cwd: &Path) -> Result<ToolOutput> {
    run_tool_as(program, args, cwd, command_line(program, args)).await
}

/// Like [`run_tool`], but messages show `command` instead of the real
/// command line (used to keep passwords out of error output).
pub async fn run_tool_as<S: AsRef<OsStr>>(
    program: &Path,
    args: &[S],
    cwd: &Path,
    command: String,
) -> Result<ToolOutput> {
    tracing::debug!(%command, cwd = %cwd.display(), "running external tool");

    let output = tokio::process::Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| GenerateError::Toolchain(format!("Failed to execute {command}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let status = output
            .status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));

        return Err(GenerateError::Toolchain(format!(
            "Command failed ({status}):\n\
             {command}\n\
             \n\
             Error:\n{}\n\
             \n\
             Output:\n{}",
            stderr.trim(),
            stdout.trim()
        )));
    }

    Ok(ToolOutput {
        command,
        stdout,
        stderr,
    })
}

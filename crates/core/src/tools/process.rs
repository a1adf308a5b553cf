use std::{ffi::OsStr, path::Path, process::Stdio, time::Duration};

use tokio::process::Command;
use tracing::debug;

use super::CollaboratorError;

/// Captured output of a tool which exited successfully
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
}

/// Runs the program to completion, killing it if it is still running after
/// `timeout`. A non-zero exit is returned as [CollaboratorError::Exit] with
/// the captured stderr.
pub async fn run_tool<I, S>(
    program: &Path,
    args: I,
    timeout: Duration,
) -> Result<ToolOutput, CollaboratorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program.display().to_string();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(?cmd, "Running external tool");

    let child = cmd.spawn().map_err(|source| CollaboratorError::Spawn {
        tool: tool.clone(),
        source,
    })?;

    // Dropping the future on timeout drops the child, which kills it
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| CollaboratorError::Timeout {
            tool: tool.clone(),
            timeout,
        })?
        .map_err(|source| CollaboratorError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(CollaboratorError::Exit {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(ToolOutput {
        stdout: output.stdout,
    })
}

//! Shell command execution.

use std::path::Path;
use std::process::ExitStatus;

use tokio::process::Command;

/// How a child command's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Inherit stdio so the child's output streams to the console.
    Streamed,
    /// Capture output; on failure it is folded into the error message.
    Quiet,
}

/// Errors from running an external command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}{detail}")]
    Failed {
        command: String,
        status: ExitStatus,
        detail: String,
    },
}

/// Build a command that runs `command` through the platform shell.
fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run `command` in `cwd` and wait for it to exit.
///
/// A non-zero exit status is an error; the caller decides whether it is
/// fatal. No retries, no timeout.
pub async fn run_command(
    command: &str,
    cwd: &Path,
    verbosity: Verbosity,
) -> Result<(), CommandError> {
    let label = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(".")
        .to_string();
    tracing::info!("[{label}] running: {command}");

    let mut cmd = shell(command);
    cmd.current_dir(cwd);

    match verbosity {
        Verbosity::Streamed => {
            let status = cmd.status().await.map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;
            if !status.success() {
                tracing::error!("command failed: {command}");
                return Err(CommandError::Failed {
                    command: command.to_string(),
                    status,
                    detail: String::new(),
                });
            }
        }
        Verbosity::Quiet => {
            let output = cmd.output().await.map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;
            if !output.status.success() {
                tracing::error!("command failed: {command}");
                let mut detail = String::new();
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stdout = String::from_utf8_lossy(&output.stdout);
                if !stderr.trim().is_empty() {
                    detail.push('\n');
                    detail.push_str(stderr.trim_end());
                }
                if !stdout.trim().is_empty() {
                    detail.push('\n');
                    detail.push_str(stdout.trim_end());
                }
                return Err(CommandError::Failed {
                    command: command.to_string(),
                    status: output.status,
                    detail,
                });
            }
        }
    }

    Ok(())
}

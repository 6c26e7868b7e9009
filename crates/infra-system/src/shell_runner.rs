// Shell command runner
// reason: tokio::process so package commands do not block the runtime
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use fleetping_core::port::{CommandError, CommandOutcome, CommandRunner, ShellCommand};

/// Runs command lines through `sh -c`, output going to our own stdout/stderr
pub struct ShellCommandRunner {
    shell: String,
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutcome, CommandError> {
        info!(command = %command.line, "Running shell command");

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(&command.line)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| CommandError::SpawnFailed {
                line: command.line.clone(),
                reason: e.to_string(),
            })?;

        debug!(command = %command.line, exit_code = ?status.code(), "Shell command finished");
        Ok(CommandOutcome::Completed {
            exit_code: status.code(),
        })
    }
}

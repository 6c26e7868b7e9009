// Aggregate transport that re-runs this executable
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use fleetping_core::domain::Invocation;
use fleetping_core::port::{AggregateError, AggregateTransport};

/// Replays an invocation by spawning `program` with the invocation's arguments
pub struct SelfReplayTransport {
    program: PathBuf,
}

impl SelfReplayTransport {
    /// Transport targeting the running binary
    ///
    /// # Errors
    /// - AggregateError::SpawnFailed if the executable path cannot be determined
    pub fn current_exe() -> Result<Self, AggregateError> {
        let program = std::env::current_exe()
            .map_err(|e| AggregateError::SpawnFailed(format!("cannot locate executable: {e}")))?;
        Ok(Self::with_program(program))
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

#[async_trait]
impl AggregateTransport for SelfReplayTransport {
    async fn fetch(&self, invocation: &Invocation) -> Result<String, AggregateError> {
        let args = invocation.to_args();
        info!(program = %self.program.display(), args = ?args, "Replaying invocation");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AggregateError::SpawnFailed(format!("{}: {e}", self.program.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(exit_code = ?output.status.code(), bytes = stdout.len(), "Replay finished");

        if !output.status.success() {
            return Err(AggregateError::RunFailed {
                code: output.status.code(),
                output: stdout,
            });
        }
        Ok(stdout)
    }
}

// Command Runner Port
// Runs a shell command line, used by the package backends

use async_trait::async_trait;
use thiserror::Error;

/// Shell command line plus variables set on the child only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub line: String,
    pub env: Vec<(String, String)>,
}

impl ShellCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// What happened to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command ran; `None` when it was killed by a signal
    Completed { exit_code: Option<i32> },
    /// Dry-run: logged but not executed
    Skipped,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CommandOutcome::Completed { exit_code: Some(0) } | CommandOutcome::Skipped
        )
    }
}

/// Command errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("failed to run '{line}': {reason}")]
    SpawnFailed { line: String, reason: String },

    #[error("IO error: {0}")]
    IoError(String),
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion
    ///
    /// # Errors
    /// - CommandError::SpawnFailed if the shell cannot be started
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutcome, CommandError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every command and reports a fixed exit code
    pub struct RecordingCommandRunner {
        commands: Mutex<Vec<ShellCommand>>,
        exit_code: i32,
    }

    impl RecordingCommandRunner {
        pub fn new() -> Self {
            Self::with_exit_code(0)
        }

        pub fn with_exit_code(exit_code: i32) -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                exit_code,
            }
        }

        pub fn commands(&self) -> Vec<ShellCommand> {
            self.commands.lock().unwrap().clone()
        }

        pub fn lines(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.line.clone())
                .collect()
        }
    }

    impl Default for RecordingCommandRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingCommandRunner {
        async fn run(&self, command: &ShellCommand) -> Result<CommandOutcome, CommandError> {
            self.commands.lock().unwrap().push(command.clone());
            Ok(CommandOutcome::Completed {
                exit_code: Some(self.exit_code),
            })
        }
    }
}

// Probe Executor Port
// Abstraction for running one probe command against one address

use crate::domain::{ProbeJob, ProbeStatus};
use async_trait::async_trait;
use thiserror::Error;

/// Classified output of one probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    pub status: ProbeStatus,
    /// Output lines read before classification stopped
    pub output: String,
}

/// Probe execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("failed to run command {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Probe Executor trait
///
/// Implementations:
/// - SubprocessProbeExecutor: spawns the probe command and classifies its output
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// Run the job's probe command and classify what it printed
    ///
    /// # Errors
    /// - ProbeError::SpawnFailed if the process cannot be started
    /// - ProbeError::IoError if its output cannot be read
    async fn probe(&self, job: &ProbeJob) -> Result<ProbeOutput, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted response for one address
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Report a status after an optional delay
        Respond { status: ProbeStatus, delay_ms: u64 },
        /// Fail as if the probe binary were missing
        SpawnFail(String),
        /// Panic inside the executor
        Panic(String),
    }

    impl MockBehavior {
        pub fn up() -> Self {
            Self::Respond {
                status: ProbeStatus::Up,
                delay_ms: 0,
            }
        }

        pub fn down() -> Self {
            Self::Respond {
                status: ProbeStatus::Down,
                delay_ms: 0,
            }
        }

        pub fn slow(status: ProbeStatus, delay_ms: u64) -> Self {
            Self::Respond { status, delay_ms }
        }
    }

    /// Mock Probe Executor keyed by address
    ///
    /// Tracks how many probes run at the same time, which lets tests check
    /// the dispatcher's concurrency ceiling.
    pub struct ScriptedProbeExecutor {
        behaviors: HashMap<String, MockBehavior>,
        fallback: MockBehavior,
        calls: Mutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ScriptedProbeExecutor {
        pub fn new(fallback: MockBehavior) -> Self {
            Self {
                behaviors: HashMap::new(),
                fallback,
                calls: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }

        pub fn with(mut self, address: impl Into<String>, behavior: MockBehavior) -> Self {
            self.behaviors.insert(address.into(), behavior);
            self
        }

        /// Addresses probed so far, in call order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Highest number of probes observed running at once
        pub fn max_active(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }
    }

    struct ActiveGuard<'a>(&'a AtomicUsize);

    impl Drop for ActiveGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProbeExecutor for ScriptedProbeExecutor {
        async fn probe(&self, job: &ProbeJob) -> Result<ProbeOutput, ProbeError> {
            self.calls.lock().unwrap().push(job.address.clone());

            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            let _guard = ActiveGuard(&self.active);

            let behavior = self
                .behaviors
                .get(&job.address)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone());

            match behavior {
                MockBehavior::Respond { status, delay_ms } => {
                    if delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    Ok(ProbeOutput {
                        status,
                        output: format!("mock {status} for {}", job.address),
                    })
                }
                MockBehavior::SpawnFail(reason) => Err(ProbeError::SpawnFailed {
                    program: job.command.program().to_string(),
                    reason,
                }),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for isolation testing
                }
            }
        }
    }
}

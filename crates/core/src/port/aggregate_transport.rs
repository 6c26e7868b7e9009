// Aggregate Transport Port
// Re-issues an invocation and hands back the combined `node: text` output

use crate::domain::Invocation;
use async_trait::async_trait;
use thiserror::Error;

/// Aggregation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("failed to start aggregation run: {0}")]
    SpawnFailed(String),

    #[error("aggregation run exited with status {code:?}")]
    RunFailed { code: Option<i32>, output: String },

    #[error("IO error: {0}")]
    IoError(String),
}

#[async_trait]
pub trait AggregateTransport: Send + Sync {
    /// Replay the invocation and return everything it printed
    ///
    /// Every output line is expected to be prefixed with `<node>: `.
    async fn fetch(&self, invocation: &Invocation) -> Result<String, AggregateError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Returns canned output and remembers the replayed arguments
    pub struct CannedTransport {
        response: Result<String, AggregateError>,
        seen_args: Mutex<Vec<Vec<String>>>,
    }

    impl CannedTransport {
        pub fn new(output: impl Into<String>) -> Self {
            Self {
                response: Ok(output.into()),
                seen_args: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: AggregateError) -> Self {
            Self {
                response: Err(error),
                seen_args: Mutex::new(Vec::new()),
            }
        }

        pub fn seen_args(&self) -> Vec<Vec<String>> {
            self.seen_args.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AggregateTransport for CannedTransport {
        async fn fetch(&self, invocation: &Invocation) -> Result<String, AggregateError> {
            self.seen_args.lock().unwrap().push(invocation.to_args());
            self.response.clone()
        }
    }
}

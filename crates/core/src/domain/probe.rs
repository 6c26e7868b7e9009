// Probe Result Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::job::ProbeJob;

/// Liveness verdict for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Up,
    Down,
    Error,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Up => write!(f, "UP"),
            ProbeStatus::Down => write!(f, "DOWN"),
            ProbeStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of probing a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub node: String,
    pub address: String,
    pub status: ProbeStatus,
    /// Combined stdout/stderr as read, up to the line that decided the status
    pub output: String,
    pub error: Option<String>,
    pub started_at: i64, // epoch ms
    pub finished_at: i64,
}

impl ProbeResult {
    pub fn completed(
        job: &ProbeJob,
        status: ProbeStatus,
        output: String,
        started_at: i64,
        finished_at: i64,
    ) -> Self {
        Self {
            node: job.node.clone(),
            address: job.address.clone(),
            status,
            output,
            error: None,
            started_at,
            finished_at,
        }
    }

    /// Local node: always up, nothing was run
    pub fn local(job: &ProbeJob, now: i64) -> Self {
        Self::completed(job, ProbeStatus::Up, String::new(), now, now)
    }

    pub fn failed(job: &ProbeJob, error: impl Into<String>, started_at: i64, finished_at: i64) -> Self {
        Self {
            node: job.node.clone(),
            address: job.address.clone(),
            status: ProbeStatus::Error,
            output: String::new(),
            error: Some(error.into()),
            started_at,
            finished_at,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ProbeStatus::Up
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at - self.started_at
    }
}

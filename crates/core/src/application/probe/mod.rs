// Probe Runner - probes one node, short-circuiting the local one

pub mod classifier;

pub use classifier::{Classifier, OutputDialect, PacketSummaryDialect, ReachabilityDialect};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::dispatcher::JobWorker;
use crate::domain::{ProbeJob, ProbeResult};
use crate::port::{ProbeError, ProbeExecutor, TimeProvider};

/// Runs exactly one probe per job and turns every outcome into a result
pub struct ProbeRunner {
    executor: Arc<dyn ProbeExecutor>,
    time_provider: Arc<dyn TimeProvider>,
    local_node: Option<String>,
}

impl ProbeRunner {
    pub fn new(executor: Arc<dyn ProbeExecutor>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            executor,
            time_provider,
            local_node: None,
        }
    }

    /// Node that is reported up without probing
    pub fn with_local_node(mut self, local_node: Option<String>) -> Self {
        self.local_node = local_node;
        self
    }

    pub fn local_node(&self) -> Option<&str> {
        self.local_node.as_deref()
    }

    /// Probe one node; never fails, errors become ERROR results
    pub async fn probe(&self, job: &ProbeJob) -> ProbeResult {
        let started_at = self.time_provider.now_millis();

        if self.local_node.as_deref() == Some(job.node.as_str()) {
            debug!(node = %job.node, "Local node, skipping probe");
            return ProbeResult::local(job, started_at);
        }

        info!(node = %job.node, address = %job.address, "pinging {}", job.node);

        match self.executor.probe(job).await {
            Ok(output) => {
                let finished_at = self.time_provider.now_millis();
                debug!(
                    node = %job.node,
                    status = %output.status,
                    duration_ms = finished_at - started_at,
                    "Probe completed"
                );
                ProbeResult::completed(job, output.status, output.output, started_at, finished_at)
            }
            Err(e) => {
                warn!(node = %job.node, error = %e, "Probe failed");
                ProbeResult::failed(job, e.to_string(), started_at, self.time_provider.now_millis())
            }
        }
    }
}

#[async_trait]
impl JobWorker for ProbeRunner {
    async fn run(&self, job: &ProbeJob) -> Result<ProbeResult, ProbeError> {
        Ok(self.probe(job).await)
    }
}

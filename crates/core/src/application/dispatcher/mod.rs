// Bounded Dispatcher - one job per node under a concurrency ceiling

pub mod constants;
mod panic_guard;
mod shutdown;

pub use panic_guard::{execute_guarded, PanicGuardResult};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::domain::{DomainError, ProbeJob, ProbeResult, ProbeStatus};
use crate::port::{ProbeError, TimeProvider};

/// Unit of work run once per job
#[async_trait]
pub trait JobWorker: Send + Sync {
    /// Produce the job's result; an error becomes an ERROR result for that node
    async fn run(&self, job: &ProbeJob) -> Result<ProbeResult, ProbeError>;
}

/// How jobs are admitted into the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPolicy {
    /// Launch as soon as a slot is free
    Immediate,
    /// Additionally wait this long between successive launches
    Paced(Duration),
    /// One job at a time, the next only after the previous produced its result
    Serialized,
}

impl LaunchPolicy {
    /// Policy for `--zzz N`: a zero delay means "run one at a time"
    pub fn from_zzz(secs: u64) -> Self {
        if secs == 0 {
            LaunchPolicy::Serialized
        } else {
            LaunchPolicy::Paced(Duration::from_secs(secs))
        }
    }

    /// Policy for the `sleep_time` setting: 0 is no delay, negative is serialized
    pub fn from_sleep_time(secs: i64) -> Self {
        match secs {
            s if s < 0 => LaunchPolicy::Serialized,
            0 => LaunchPolicy::Immediate,
            s => LaunchPolicy::Paced(Duration::from_secs(s.unsigned_abs())),
        }
    }

    fn launch_delay(&self) -> Option<Duration> {
        match self {
            LaunchPolicy::Paced(delay) => Some(*delay),
            LaunchPolicy::Immediate | LaunchPolicy::Serialized => None,
        }
    }
}

/// Read-only dispatch settings for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    concurrency: usize,
    policy: LaunchPolicy,
}

impl DispatchConfig {
    /// # Errors
    /// - DomainError::ValidationError if `concurrency` is zero
    pub fn new(concurrency: usize, policy: LaunchPolicy) -> Result<Self, DomainError> {
        if concurrency == 0 {
            return Err(DomainError::ValidationError(
                "concurrency bound must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            concurrency,
            policy,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn policy(&self) -> LaunchPolicy {
        self.policy
    }

    /// Worker slots actually used; serialized mode is a pool of one
    pub fn effective_concurrency(&self) -> usize {
        match self.policy {
            LaunchPolicy::Serialized => 1,
            LaunchPolicy::Immediate | LaunchPolicy::Paced(_) => self.concurrency,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: constants::DEFAULT_NUM_PROC,
            policy: LaunchPolicy::Immediate,
        }
    }
}

/// Everything a dispatch produced
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Results in completion order
    pub results: Vec<ProbeResult>,
    /// Set when the run was cut short by a shutdown signal
    pub interrupted: bool,
}

impl DispatchOutcome {
    pub fn status_of(&self, node: &str) -> Option<ProbeStatus> {
        self.results
            .iter()
            .find(|r| r.node == node)
            .map(|r| r.status)
    }
}

/// Runs jobs with bounded parallelism and per-job failure isolation
pub struct Dispatcher {
    config: DispatchConfig,
    time_provider: Arc<dyn TimeProvider>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            config,
            time_provider,
        }
    }

    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// Run every job and report each result through `on_result` as it completes
    ///
    /// Jobs are admitted in submission order. Returns once every job has a
    /// result, or early when `shutdown` fires; in-flight jobs are then
    /// aborted and the outcome is flagged as interrupted.
    pub async fn dispatch<F>(
        &self,
        jobs: Vec<ProbeJob>,
        worker: Arc<dyn JobWorker>,
        mut shutdown: ShutdownToken,
        mut on_result: F,
    ) -> DispatchOutcome
    where
        F: FnMut(&ProbeResult),
    {
        let total = jobs.len();
        info!(
            jobs = total,
            concurrency = self.config.effective_concurrency(),
            policy = ?self.config.policy(),
            "Dispatching jobs"
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let launcher = tokio::spawn(launch_jobs(
            jobs,
            worker,
            self.config,
            Arc::clone(&self.time_provider),
            tx,
        ));

        let mut outcome = DispatchOutcome {
            results: Vec::with_capacity(total),
            interrupted: false,
        };

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(result) => {
                        on_result(&result);
                        outcome.results.push(result);
                    }
                    // every sender is gone: all jobs have reported
                    None => break,
                },
                _ = shutdown.wait() => {
                    if outcome.results.len() == total {
                        debug!(total, "Shutdown requested after every job reported");
                        break;
                    }
                    info!(
                        completed = outcome.results.len(),
                        total,
                        "Dispatch interrupted, abandoning in-flight jobs"
                    );
                    outcome.interrupted = true;
                    launcher.abort();
                    break;
                }
            }
        }

        match launcher.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => debug!("Launcher cancelled"),
            Err(e) => error!(error = %e, "Launcher task failed"),
        }

        // results that landed while the launcher was being torn down
        while let Ok(result) = rx.try_recv() {
            on_result(&result);
            outcome.results.push(result);
        }

        info!(
            completed = outcome.results.len(),
            total,
            interrupted = outcome.interrupted,
            "Dispatch finished"
        );
        outcome
    }
}

/// Admit jobs one by one as worker slots free up
///
/// Owns every worker task: aborting the launcher drops the JoinSet, which
/// aborts the workers and with them their child processes.
async fn launch_jobs(
    jobs: Vec<ProbeJob>,
    worker: Arc<dyn JobWorker>,
    config: DispatchConfig,
    time_provider: Arc<dyn TimeProvider>,
    tx: mpsc::UnboundedSender<ProbeResult>,
) {
    let semaphore = Arc::new(Semaphore::new(config.effective_concurrency()));
    let delay = config.policy().launch_delay();
    let mut tasks = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        if let (true, Some(delay)) = (index > 0, delay) {
            tokio::time::sleep(delay).await;
        }

        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            error!("Worker pool closed unexpectedly");
            break;
        };

        debug!(node = %job.node, address = %job.address, "Launching job");
        let worker = Arc::clone(&worker);
        let time_provider = Arc::clone(&time_provider);
        let tx = tx.clone();

        tasks.spawn(async move {
            let result = run_isolated(worker.as_ref(), &job, time_provider.as_ref()).await;
            // receiver gone means the dispatch was abandoned
            let _ = tx.send(result);
            // slot is released only after the result is out
            drop(permit);
        });
    }
    drop(tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Job task failed");
        }
    }
}

async fn run_isolated(
    worker: &dyn JobWorker,
    job: &ProbeJob,
    time_provider: &dyn TimeProvider,
) -> ProbeResult {
    let started_at = time_provider.now_millis();

    match execute_guarded(worker.run(job)).await {
        PanicGuardResult::Success(Ok(result)) => result,
        PanicGuardResult::Success(Err(e)) => {
            warn!(node = %job.node, error = %e, "Job failed");
            ProbeResult::failed(job, e.to_string(), started_at, time_provider.now_millis())
        }
        PanicGuardResult::Panicked(msg) => ProbeResult::failed(
            job,
            ProbeError::Panicked(msg).to_string(),
            started_at,
            time_provider.now_millis(),
        ),
    }
}

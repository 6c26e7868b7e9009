// Subprocess probe executor
// reason: tokio::process for async child management with kill-on-drop
use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use fleetping_core::application::probe::Classifier;
use fleetping_core::domain::ProbeJob;
use fleetping_core::port::{ProbeError, ProbeExecutor, ProbeOutput};

/// Variables passed through to probe commands; everything else is cleared
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "LC_ALL"];

enum Stream {
    Stdout,
    Stderr,
}

/// Spawns the probe command for each job and classifies its output
///
/// Stdout and stderr are read as one merged line stream. Reading stops at
/// the first line the classifier recognizes; the child is then reaped.
pub struct SubprocessProbeExecutor {
    classifier: Classifier,
    env_allowlist: Vec<String>,
    echo_commands: bool,
}

impl SubprocessProbeExecutor {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            echo_commands: false,
        }
    }

    pub fn with_env_allowlist(mut self, env_allowlist: Vec<String>) -> Self {
        self.env_allowlist = env_allowlist;
        self
    }

    /// Print each probe command line on stdout before running it
    pub fn with_echo_commands(mut self, echo: bool) -> Self {
        self.echo_commands = echo;
        self
    }

    /// Current values of the allowlisted variables
    fn filter_env(&self) -> Vec<(String, String)> {
        self.env_allowlist
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.clone(), v)))
            .collect()
    }

    fn echo(&self, job: &ProbeJob) {
        if !self.echo_commands {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        // a closed stdout is noticed by the result printer
        let _ = writeln!(stdout, "{}", job.command_line());
    }
}

impl Default for SubprocessProbeExecutor {
    fn default() -> Self {
        Self::new(Classifier::standard())
    }
}

#[async_trait]
impl ProbeExecutor for SubprocessProbeExecutor {
    async fn probe(&self, job: &ProbeJob) -> Result<ProbeOutput, ProbeError> {
        self.echo(job);

        let program = job.command.program();
        let mut child = Command::new(program)
            .args(job.command.args_for(&job.address))
            .env_clear()
            .envs(self.filter_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProbeError::SpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProbeError::IoError("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProbeError::IoError("stderr not captured".to_string()))?;

        // raw segments; probe output is not guaranteed to be UTF-8
        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let (mut stdout_open, mut stderr_open) = (true, true);
        let mut output = String::new();
        let mut status = None;

        while stdout_open || stderr_open {
            let (stream, next) = tokio::select! {
                next = stdout.next_segment(), if stdout_open => (Stream::Stdout, next),
                next = stderr.next_segment(), if stderr_open => (Stream::Stderr, next),
            };

            match next.map_err(|e| ProbeError::IoError(e.to_string()))? {
                Some(segment) => {
                    let line = decode_line(&segment);
                    output.push_str(&line);
                    output.push('\n');
                    if let Some(verdict) = self.classifier.classify_line(&line) {
                        status = Some(verdict);
                        break;
                    }
                }
                None => match stream {
                    Stream::Stdout => stdout_open = false,
                    Stream::Stderr => stderr_open = false,
                },
            }
        }

        // close our ends first so a chatty child cannot block on a full pipe
        drop(stdout);
        drop(stderr);

        // nothing more is read from a classified probe
        if status.is_some() {
            if let Ok(None) = child.try_wait() {
                let _ = child.start_kill();
            }
        }

        match child.wait().await {
            Ok(exit) => debug!(node = %job.node, exit_code = ?exit.code(), "Probe process exited"),
            Err(e) => warn!(node = %job.node, error = %e, "Failed to reap probe process"),
        }

        let status = status.unwrap_or(Classifier::NO_MATCH);
        debug!(node = %job.node, status = %status, "Probe classified");
        Ok(ProbeOutput { status, output })
    }
}

/// Lossy decode of one output line, without its line terminator
fn decode_line(segment: &[u8]) -> String {
    let segment = segment.strip_suffix(b"\r").unwrap_or(segment);
    String::from_utf8_lossy(segment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetping_core::domain::{ProbeCommand, ProbeStatus};
    use std::sync::Arc;

    fn sh_job(script: &str) -> ProbeJob {
        // the address lands in $0 of the script and is ignored
        let command = ProbeCommand::parse(&format!("sh -c '{script}'")).unwrap();
        ProbeJob::new("node1", "10.0.0.1", Arc::new(command))
    }

    #[tokio::test]
    async fn test_packet_summary_up() {
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo PING 10.0.0.1; echo 1 packets transmitted, 1 received, 0% packet loss");

        let output = executor.probe(&job).await.unwrap();
        assert_eq!(output.status, ProbeStatus::Up);
        assert!(output.output.contains("packets transmitted"));
    }

    #[tokio::test]
    async fn test_packet_summary_down() {
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo 1 packets transmitted, 0 received, 100% packet loss");

        let output = executor.probe(&job).await.unwrap();
        assert_eq!(output.status, ProbeStatus::Down);
    }

    #[tokio::test]
    async fn test_no_recognized_line_is_down() {
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo something else entirely");

        let output = executor.probe(&job).await.unwrap();
        assert_eq!(output.status, ProbeStatus::Down);
    }

    #[tokio::test]
    async fn test_stderr_is_classified_too() {
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo 10.0.0.1 is alive >&2");

        let output = executor.probe(&job).await.unwrap();
        assert_eq!(output.status, ProbeStatus::Up);
    }

    #[tokio::test]
    async fn test_stops_at_first_match() {
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo 10.0.0.1 is unreachable; echo 10.0.0.1 is alive");

        let output = executor.probe(&job).await.unwrap();
        assert_eq!(output.status, ProbeStatus::Down);
        assert!(!output.output.contains("alive"));
    }

    #[tokio::test]
    async fn test_does_not_wait_for_trailing_output() {
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo 10.0.0.1 is alive; exec sleep 30");

        let output = tokio::time::timeout(std::time::Duration::from_secs(10), executor.probe(&job))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.status, ProbeStatus::Up);
    }

    #[tokio::test]
    async fn test_invalid_utf8_before_summary_is_tolerated() {
        let executor = SubprocessProbeExecutor::default();
        // Latin-1 banner line, then the summary
        let job = sh_job(
            r#"printf "r\351ponse\n1 packets transmitted, 1 received, 0%% packet loss\n""#,
        );

        let output = executor.probe(&job).await.unwrap();
        assert_eq!(output.status, ProbeStatus::Up);
        assert!(output.output.starts_with("r\u{FFFD}ponse\n"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let executor = SubprocessProbeExecutor::default();
        let command = ProbeCommand::parse("fleetping-no-such-binary -c 1").unwrap();
        let job = ProbeJob::new("node1", "10.0.0.1", Arc::new(command));

        let result = executor.probe(&job).await;
        match result {
            Err(ProbeError::SpawnFailed { program, .. }) => {
                assert_eq!(program, "fleetping-no-such-binary");
            }
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_environment_is_allowlisted() {
        std::env::set_var("FLEETPING_PROBE_SECRET", "leak");
        let executor = SubprocessProbeExecutor::default();
        let job = sh_job("echo ${FLEETPING_PROBE_SECRET:-clean} is alive");

        let output = executor.probe(&job).await.unwrap();
        assert!(output.output.starts_with("clean is alive"));
    }
}

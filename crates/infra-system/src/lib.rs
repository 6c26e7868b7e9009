// fleet-ping Infrastructure - System Adapters
// Implements: ProbeExecutor, HostIdentity, CommandRunner, AggregateTransport

pub mod host_identity;
pub mod self_replay;
pub mod shell_runner;
pub mod subprocess_probe;

pub use host_identity::SystemHostIdentity;
pub use self_replay::SelfReplayTransport;
pub use shell_runner::ShellCommandRunner;
pub use subprocess_probe::{SubprocessProbeExecutor, DEFAULT_ENV_ALLOWLIST};

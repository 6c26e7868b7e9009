// Port Layer - Interfaces for external dependencies

pub mod aggregate_transport;
pub mod command_runner;
pub mod host_identity;
pub mod probe_executor;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use aggregate_transport::{AggregateError, AggregateTransport};
pub use command_runner::{CommandError, CommandOutcome, CommandRunner, ShellCommand};
pub use host_identity::HostIdentity;
pub use probe_executor::{ProbeError, ProbeExecutor, ProbeOutput};
pub use time_provider::{SystemTimeProvider, TimeProvider};

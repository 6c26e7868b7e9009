// Application Layer - Use Cases

pub mod aggregator;
pub mod dispatcher;
pub mod local_node;
pub mod package;
pub mod probe;

// Re-exports
pub use aggregator::{group_identical, parse_node_lines, Aggregator, OutputGroup};
pub use dispatcher::{
    shutdown_channel, DispatchConfig, DispatchOutcome, Dispatcher, JobWorker, LaunchPolicy,
    ShutdownSender, ShutdownToken,
};
pub use local_node::resolve_local_node;
pub use package::{ExecutionContext, PackageBackend, PackageManager, PackageOp, PackageOperations};
pub use probe::{Classifier, ProbeRunner};

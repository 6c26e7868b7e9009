// Domain Layer - Nodes, selections, jobs and their results

pub mod error;
pub mod invocation;
pub mod job;
pub mod node;
pub mod probe;
pub mod selection;

// Re-exports
pub use error::DomainError;
pub use invocation::Invocation;
pub use job::{ProbeCommand, ProbeJob};
pub use node::{GroupSpec, Node, NodeRegistry, NodeSpec, ALL_GROUP};
pub use probe::{ProbeResult, ProbeStatus};
pub use selection::{NodeSet, ResolvedNode, SelectionOp};

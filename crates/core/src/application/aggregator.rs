// Aggregator - condenses identical per-node output

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::Invocation;
use crate::port::{AggregateError, AggregateTransport};

/// Nodes that produced byte-identical output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGroup {
    pub nodes: Vec<String>,
    pub output: String,
}

impl OutputGroup {
    /// Member names joined the way the CLI prints them
    pub fn label(&self) -> String {
        self.nodes.join(",")
    }
}

/// Split `node: text` lines into per-node output
///
/// Nodes keep the order in which they first appear; a node's lines are joined
/// with newlines. Lines without a `node: ` prefix are dropped.
pub fn parse_node_lines(raw: &str) -> Vec<(String, String)> {
    let mut outputs: Vec<(String, String)> = Vec::new();

    for line in raw.lines() {
        let Some((node, text)) = line.split_once(": ") else {
            if !line.trim().is_empty() {
                warn!(line, "Ignoring output line without node prefix");
            }
            continue;
        };

        match outputs.iter_mut().find(|(n, _)| n == node) {
            Some((_, output)) => {
                output.push('\n');
                output.push_str(text);
            }
            None => outputs.push((node.to_string(), text.to_string())),
        }
    }

    outputs
}

/// Partition `(node, output)` pairs by identical output, in order of first appearance
pub fn group_identical(outputs: Vec<(String, String)>) -> Vec<OutputGroup> {
    let mut groups: Vec<OutputGroup> = Vec::new();

    for (node, output) in outputs {
        match groups.iter_mut().find(|g| g.output == output) {
            Some(group) => group.nodes.push(node),
            None => groups.push(OutputGroup {
                nodes: vec![node],
                output,
            }),
        }
    }

    groups
}

/// Re-runs an invocation and condenses its output
pub struct Aggregator {
    transport: Arc<dyn AggregateTransport>,
}

impl Aggregator {
    pub fn new(transport: Arc<dyn AggregateTransport>) -> Self {
        Self { transport }
    }

    /// # Errors
    /// - AggregateError from the transport; nothing is grouped then
    pub async fn run(&self, invocation: &Invocation) -> Result<Vec<OutputGroup>, AggregateError> {
        let raw = self.transport.fetch(invocation).await?;
        let groups = group_identical(parse_node_lines(&raw));
        info!(groups = groups.len(), "Aggregated output");
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SelectionOp;
    use crate::port::aggregate_transport::mocks::CannedTransport;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(n, o)| (n.to_string(), o.to_string()))
            .collect()
    }

    #[test]
    fn test_group_identical_first_appearance_order() {
        let groups = group_identical(pairs(&[
            ("n1", "up"),
            ("n2", "not responding"),
            ("n3", "up"),
            ("n4", "not responding"),
            ("n5", "error (boom)"),
        ]));

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].nodes, vec!["n1", "n3"]);
        assert_eq!(groups[0].output, "up");
        assert_eq!(groups[1].nodes, vec!["n2", "n4"]);
        assert_eq!(groups[2].label(), "n5");
    }

    #[test]
    fn test_group_identical_is_byte_exact() {
        let groups = group_identical(pairs(&[("n1", "up"), ("n2", "up ")]));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_group_identical_empty() {
        assert!(group_identical(Vec::new()).is_empty());
    }

    #[test]
    fn test_parse_node_lines_collects_multiline_output() {
        let raw = "n1: first\nn2: other\nn1: second\n\ngarbage\n";
        let parsed = parse_node_lines(raw);

        assert_eq!(
            parsed,
            pairs(&[("n1", "first\nsecond"), ("n2", "other")])
        );
    }

    #[test]
    fn test_parse_keeps_colons_in_text() {
        let parsed = parse_node_lines("n1: error (failed to run command ping: gone)");
        assert_eq!(parsed[0].1, "error (failed to run command ping: gone)");
    }

    #[tokio::test]
    async fn test_run_groups_transport_output() {
        let transport = Arc::new(CannedTransport::new(
            "n1: up\nn2: not responding\nn3: up\n",
        ));
        let aggregator = Aggregator::new(transport.clone());
        let invocation = Invocation {
            selection: vec![SelectionOp::AddGroup("web".to_string())],
            ..Invocation::default()
        };

        let groups = aggregator.run(&invocation).await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label(), "n1,n3");
        assert_eq!(transport.seen_args(), vec![vec!["--group", "web"]]);
    }

    #[tokio::test]
    async fn test_run_propagates_transport_failure() {
        let transport = Arc::new(CannedTransport::failing(AggregateError::RunFailed {
            code: Some(1),
            output: String::new(),
        }));

        let result = Aggregator::new(transport).run(&Invocation::default()).await;
        assert!(matches!(result, Err(AggregateError::RunFailed { .. })));
    }
}

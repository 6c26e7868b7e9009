// Probe Job Domain Model

use std::sync::Arc;

use super::error::{DomainError, Result};
use super::selection::ResolvedNode;

/// Probe command template, e.g. `ping -q -c 1 -t 1`
///
/// The target address is appended as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCommand {
    program: String,
    args: Vec<String>,
}

impl ProbeCommand {
    /// Parse a template using shell word-splitting rules
    ///
    /// # Errors
    /// - DomainError::InvalidCommand for unbalanced quoting or an empty template
    pub fn parse(template: &str) -> Result<Self> {
        let mut words = shell_words::split(template)
            .map_err(|e| DomainError::InvalidCommand(format!("{template}: {e}")))?
            .into_iter();

        let program = words
            .next()
            .ok_or_else(|| DomainError::InvalidCommand("empty command".to_string()))?;

        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one target
    pub fn args_for(&self, address: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(address.to_string());
        args
    }

    /// Shell-quoted command line for one target
    pub fn render(&self, address: &str) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 2);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        words.push(address);
        shell_words::join(words)
    }
}

/// One unit of dispatched work: probe `address` on behalf of `node`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeJob {
    pub node: String,
    pub address: String,
    pub command: Arc<ProbeCommand>,
}

impl ProbeJob {
    pub fn new(
        node: impl Into<String>,
        address: impl Into<String>,
        command: Arc<ProbeCommand>,
    ) -> Self {
        Self {
            node: node.into(),
            address: address.into(),
            command,
        }
    }

    /// One job per resolved node, sharing the same command template
    pub fn for_nodes(nodes: Vec<ResolvedNode>, command: Arc<ProbeCommand>) -> Vec<Self> {
        nodes
            .into_iter()
            .map(|n| Self::new(n.name, n.address, Arc::clone(&command)))
            .collect()
    }

    pub fn command_line(&self) -> String {
        self.command.render(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template() {
        let cmd = ProbeCommand::parse("ping -q -c 1 -t 1").unwrap();
        assert_eq!(cmd.program(), "ping");
        assert_eq!(cmd.args_for("10.0.0.1"), vec!["-q", "-c", "1", "-t", "1", "10.0.0.1"]);
    }

    #[test]
    fn test_parse_quoted_template() {
        let cmd = ProbeCommand::parse("sh -c 'echo \"$0 is alive\"'").unwrap();
        assert_eq!(cmd.program(), "sh");
        assert_eq!(cmd.args_for("host"), vec!["-c", "echo \"$0 is alive\"", "host"]);
    }

    #[test]
    fn test_parse_rejects_empty_and_unbalanced() {
        assert!(matches!(
            ProbeCommand::parse("   "),
            Err(DomainError::InvalidCommand(_))
        ));
        assert!(matches!(
            ProbeCommand::parse("ping 'oops"),
            Err(DomainError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_render_command_line() {
        let cmd = Arc::new(ProbeCommand::parse("ping -c 1").unwrap());
        let job = ProbeJob::new("node1", "10.0.0.1", cmd);
        assert_eq!(job.command_line(), "ping -c 1 10.0.0.1");
    }

    #[test]
    fn test_jobs_for_nodes_keep_order() {
        let cmd = Arc::new(ProbeCommand::parse("ping").unwrap());
        let jobs = ProbeJob::for_nodes(
            vec![
                ResolvedNode {
                    name: "b".to_string(),
                    address: "10.0.0.2".to_string(),
                },
                ResolvedNode {
                    name: "a".to_string(),
                    address: "10.0.0.1".to_string(),
                },
            ],
            cmd,
        );
        let nodes: Vec<&str> = jobs.iter().map(|j| j.node.as_str()).collect();
        assert_eq!(nodes, vec!["b", "a"]);
    }
}

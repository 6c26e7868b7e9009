// Node Selection - turns include/exclude specs into an ordered address list

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::error::{DomainError, Result};
use super::node::{NodeRegistry, ALL_GROUP};

/// One selection step, in the order it was given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOp {
    AddNode(String),
    AddGroup(String),
    ExcludeNode(String),
    ExcludeGroup(String),
}

impl SelectionOp {
    /// Command-line flag that reproduces this step
    pub fn flag(&self) -> &'static str {
        match self {
            SelectionOp::AddNode(_) => "--node",
            SelectionOp::AddGroup(_) => "--group",
            SelectionOp::ExcludeNode(_) => "--exclude",
            SelectionOp::ExcludeGroup(_) => "--exclude-group",
        }
    }

    pub fn spec(&self) -> &str {
        match self {
            SelectionOp::AddNode(s)
            | SelectionOp::AddGroup(s)
            | SelectionOp::ExcludeNode(s)
            | SelectionOp::ExcludeGroup(s) => s,
        }
    }

    pub fn is_inclusion(&self) -> bool {
        matches!(self, SelectionOp::AddNode(_) | SelectionOp::AddGroup(_))
    }
}

impl fmt::Display for SelectionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flag(), self.spec())
    }
}

/// A node picked by the selection, paired with the address to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub name: String,
    pub address: String,
}

/// Accumulating node selection
///
/// Inclusions keep their order; exclusions are kept apart and always win,
/// no matter how often or through which group a node was included.
#[derive(Debug, Clone)]
pub struct NodeSet {
    registry: Arc<NodeRegistry>,
    included: Vec<usize>,
    excluded: HashSet<usize>,
    has_inclusions: bool,
}

/// Split a comma-separated list, skipping blanks left by stray commas
fn split_spec(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl NodeSet {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            included: Vec::new(),
            excluded: HashSet::new(),
            has_inclusions: false,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Apply a recorded selection step
    pub fn apply(&mut self, op: &SelectionOp) -> Result<()> {
        match op {
            SelectionOp::AddNode(spec) => self.add_node(spec),
            SelectionOp::AddGroup(spec) => self.add_group(spec),
            SelectionOp::ExcludeNode(spec) => self.exclude_node(spec),
            SelectionOp::ExcludeGroup(spec) => self.exclude_group(spec),
        }
    }

    /// Include nodes by name
    ///
    /// # Errors
    /// - DomainError::UnknownNode for a name not in the registry; nothing is
    ///   added from this spec in that case
    pub fn add_node(&mut self, spec: &str) -> Result<()> {
        let indices = self.lookup_nodes(spec)?;
        self.has_inclusions = true;
        self.included.extend(indices);
        Ok(())
    }

    /// Include every member of the named groups
    pub fn add_group(&mut self, spec: &str) -> Result<()> {
        let indices = self.lookup_groups(spec)?;
        self.has_inclusions = true;
        self.included.extend(indices);
        Ok(())
    }

    pub fn exclude_node(&mut self, spec: &str) -> Result<()> {
        let indices = self.lookup_nodes(spec)?;
        self.excluded.extend(indices);
        Ok(())
    }

    pub fn exclude_group(&mut self, spec: &str) -> Result<()> {
        let indices = self.lookup_groups(spec)?;
        self.excluded.extend(indices);
        Ok(())
    }

    fn lookup_nodes(&self, spec: &str) -> Result<Vec<usize>> {
        split_spec(spec)
            .map(|name| {
                self.registry
                    .index_of(name)
                    .ok_or_else(|| DomainError::UnknownNode(name.to_string()))
            })
            .collect()
    }

    fn lookup_groups(&self, spec: &str) -> Result<Vec<usize>> {
        let mut indices = Vec::new();
        for group in split_spec(spec) {
            let members = self
                .registry
                .group_indices(group)
                .ok_or_else(|| DomainError::UnknownGroup(group.to_string()))?;
            indices.extend_from_slice(members);
        }
        Ok(indices)
    }

    /// Selected nodes in inclusion order, exclusions removed, no repeats
    ///
    /// Without any inclusion the whole fleet is selected.
    pub fn resolve(&self) -> Vec<ResolvedNode> {
        let candidates: Vec<usize> = if self.has_inclusions {
            self.included.clone()
        } else {
            self.registry
                .group_indices(ALL_GROUP)
                .map(<[usize]>::to_vec)
                .unwrap_or_default()
        };

        let mut seen_nodes = HashSet::new();
        let mut seen_addresses = HashSet::new();
        let mut resolved = Vec::new();

        for idx in candidates {
            if self.excluded.contains(&idx) || !seen_nodes.insert(idx) {
                continue;
            }
            let node = self.registry.node_at(idx);
            let address = node.primary_address();
            if !seen_addresses.insert(address.to_string()) {
                continue;
            }
            resolved.push(ResolvedNode {
                name: node.name().to_string(),
                address: address.to_string(),
            });
        }
        resolved
    }

    /// Ordered, deduplicated addresses of the net selection
    ///
    /// An empty list means "nothing to do", not a failure.
    pub fn addresses(&self) -> Vec<String> {
        self.resolve().into_iter().map(|r| r.address).collect()
    }

    pub fn get_nodename_from_address(&self, address: &str) -> Result<&str> {
        self.registry.get_nodename_from_address(address)
    }
}

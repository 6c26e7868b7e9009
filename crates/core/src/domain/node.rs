// Node Registry - static description of the managed fleet

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::error::{DomainError, Result};

/// Group that every configured node belongs to
pub const ALL_GROUP: &str = "all";

/// Node entry as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Network addresses; the node name is used when none is given
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            addresses: Vec::new(),
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }
}

/// Compound group: a named list of other groups (or node names)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl GroupSpec {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single managed machine. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    addresses: Vec<String>,
    groups: Vec<String>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Address used to reach the node (the first configured one)
    pub fn primary_address(&self) -> &str {
        // addresses is never empty: it falls back to the node name
        &self.addresses[0]
    }

    /// Groups this node was explicitly placed in
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn has_address(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }
}

/// Registry of all configured nodes and groups
///
/// Group membership is stored as node indices in configuration order, so
/// resolving a group always yields its nodes in the order they were defined.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
    by_name: HashMap<String, usize>,
    groups: HashMap<String, Vec<usize>>,
}

impl NodeRegistry {
    /// Build the registry, validating names and expanding compound groups
    ///
    /// # Errors
    /// - DomainError::DuplicateNode / DuplicateGroup for repeated definitions
    /// - DomainError::GroupNodeConflict when a group shares a node's name
    /// - DomainError::UnknownGroup when a compound group names something undefined
    /// - DomainError::GroupCycle when compound groups include each other
    pub fn new(node_specs: Vec<NodeSpec>, group_specs: Vec<GroupSpec>) -> Result<Self> {
        let mut nodes = Vec::with_capacity(node_specs.len());
        let mut by_name = HashMap::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();

        for spec in node_specs {
            let name = spec.name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::ValidationError(
                    "node name must not be empty".to_string(),
                ));
            }
            if by_name.contains_key(&name) {
                return Err(DomainError::DuplicateNode(name));
            }

            let idx = nodes.len();
            let mut node_groups: Vec<String> = Vec::new();
            for group in spec.groups.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
                if !node_groups.iter().any(|g| g == group) {
                    node_groups.push(group.to_string());
                    groups.entry(group.to_string()).or_default().push(idx);
                }
            }

            let mut addresses: Vec<String> = spec
                .addresses
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            if addresses.is_empty() {
                addresses.push(name.clone());
            }

            by_name.insert(name.clone(), idx);
            nodes.push(Node {
                name,
                addresses,
                groups: node_groups,
            });
        }

        if by_name.contains_key(ALL_GROUP) {
            return Err(DomainError::GroupNodeConflict(ALL_GROUP.to_string()));
        }
        if let Some(conflict) = groups.keys().find(|g| by_name.contains_key(*g)) {
            return Err(DomainError::GroupNodeConflict(conflict.clone()));
        }
        groups.insert(ALL_GROUP.to_string(), (0..nodes.len()).collect());

        let compound = Self::index_compound_groups(&group_specs, &by_name)?;
        let mut expanded: HashMap<String, BTreeSet<usize>> = HashMap::new();
        for spec in &group_specs {
            let mut visiting = Vec::new();
            let members = Self::expand_group(
                spec.name.trim(),
                &compound,
                &groups,
                &by_name,
                &mut visiting,
                &mut expanded,
            )?;
            debug!(group = %spec.name, members = members.len(), "Expanded compound group");
        }
        for (name, members) in expanded {
            groups.insert(name, members.into_iter().collect());
        }

        // Every node is also a group of one, under its own name
        for (name, idx) in &by_name {
            groups.insert(name.clone(), vec![*idx]);
        }

        Ok(Self {
            nodes,
            by_name,
            groups,
        })
    }

    fn index_compound_groups<'a>(
        specs: &'a [GroupSpec],
        by_name: &HashMap<String, usize>,
    ) -> Result<HashMap<&'a str, &'a GroupSpec>> {
        let mut compound = HashMap::new();
        for spec in specs {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(DomainError::ValidationError(
                    "group name must not be empty".to_string(),
                ));
            }
            if by_name.contains_key(name) {
                return Err(DomainError::GroupNodeConflict(name.to_string()));
            }
            if compound.insert(name, spec).is_some() {
                return Err(DomainError::DuplicateGroup(name.to_string()));
            }
        }
        Ok(compound)
    }

    fn expand_group(
        name: &str,
        compound: &HashMap<&str, &GroupSpec>,
        plain: &HashMap<String, Vec<usize>>,
        by_name: &HashMap<String, usize>,
        visiting: &mut Vec<String>,
        expanded: &mut HashMap<String, BTreeSet<usize>>,
    ) -> Result<BTreeSet<usize>> {
        if let Some(done) = expanded.get(name) {
            return Ok(done.clone());
        }

        let Some(spec) = compound.get(name) else {
            if let Some(idx) = by_name.get(name) {
                return Ok(BTreeSet::from([*idx]));
            }
            return plain
                .get(name)
                .map(|members| members.iter().copied().collect())
                .ok_or_else(|| DomainError::UnknownGroup(name.to_string()));
        };

        if visiting.iter().any(|v| v == name) {
            return Err(DomainError::GroupCycle(name.to_string()));
        }
        visiting.push(name.to_string());

        // A compound group may extend a group that nodes already declare
        let mut members: BTreeSet<usize> = plain
            .get(name)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        for member in spec.members.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
            let sub = Self::expand_group(member, compound, plain, by_name, visiting, expanded)?;
            members.extend(sub);
        }

        visiting.pop();
        expanded.insert(name.to_string(), members.clone());
        Ok(members)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).map(|idx| &self.nodes[*idx])
    }

    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Members of a group, in configuration order
    pub fn group_members(&self, group: &str) -> Option<impl Iterator<Item = &Node> + '_> {
        self.groups
            .get(group)
            .map(|members| members.iter().map(|idx| &self.nodes[*idx]))
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn group_indices(&self, group: &str) -> Option<&[usize]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Reverse lookup used to label output with a readable name
    ///
    /// # Errors
    /// - DomainError::UnknownAddress if no node carries this address
    pub fn get_nodename_from_address(&self, address: &str) -> Result<&str> {
        self.nodes
            .iter()
            .find(|node| node.has_address(address))
            .map(Node::name)
            .ok_or_else(|| DomainError::UnknownAddress(address.to_string()))
    }
}

//! Port and link model for the node chain.

use serde::{Deserialize, Serialize};

use super::arena::{LinkId, NodeId, PortId};

/// Direction of a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

/// A connection point on a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub node: NodeId,
    pub direction: PortDirection,
}

/// A directed connection from an output port to an input port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    /// Output port of the upstream node
    pub source: PortId,
    /// Input port of the downstream node
    pub target: PortId,
}

/// A link described by the aliases of the nodes it joins.
///
/// Handles are not stable across delete/restore, aliases are, so history entries
/// record links in this form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkEnds {
    pub source: String,
    pub target: String,
}

impl LinkEnds {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

impl std::fmt::Display for LinkEnds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Result of [`GraphStore::add_link`](super::graph::GraphStore::add_link).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkOutcome {
    pub id: LinkId,
    /// Link that previously left the same source port and was removed.
    pub replaced: Option<Link>,
}

//! Active path resolution.
//!
//! The active path starts at the Input node and follows the unique link leaving each
//! node's output port. Branches not reachable this way are inert.

use std::collections::HashSet;

use super::arena::NodeId;
use super::graph::GraphStore;

/// Node sequence reachable from Input, in processing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivePath {
    nodes: Vec<NodeId>,
    complete: bool,
}

impl ActivePath {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// True iff the walk ended on the Output node.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes strictly between Input and Output. Empty unless the path is complete.
    pub fn intermediate(&self) -> &[NodeId] {
        if !self.complete || self.nodes.len() < 2 {
            return &[];
        }
        &self.nodes[1..self.nodes.len() - 1]
    }
}

/// Walks the graph from Input. Rebuilt from scratch on every call.
pub fn resolve_path(graph: &GraphStore) -> ActivePath {
    let input = graph.input_id();
    if graph.node(input).is_none() {
        return ActivePath::default();
    }

    let mut nodes = vec![input];
    let mut visited = HashSet::from([input]);
    let mut current = input;

    while let Some(next) = graph.next_node(current) {
        // Prevent infinite loops
        if !visited.insert(next) {
            return ActivePath {
                nodes,
                complete: false,
            };
        }
        nodes.push(next);
        current = next;
    }

    let complete = current == graph.output_id();
    ActivePath { nodes, complete }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::graph_node::Position;
    use crate::plugin::ModuleKind;

    fn connect(graph: &mut GraphStore, from: NodeId, to: NodeId) {
        let source = graph.node(from).unwrap().output_port.unwrap();
        let target = graph.node(to).unwrap().input_port.unwrap();
        graph.add_link(source, target).unwrap();
    }

    #[test]
    fn test_fresh_graph_is_incomplete() {
        let graph = GraphStore::new();
        let path = resolve_path(&graph);
        assert_eq!(path.nodes(), &[graph.input_id()]);
        assert!(!path.is_complete());
        assert!(path.intermediate().is_empty());
    }

    #[test]
    fn test_direct_link_is_complete() {
        let mut graph = GraphStore::new();
        let (input, output) = (graph.input_id(), graph.output_id());
        connect(&mut graph, input, output);
        let path = resolve_path(&graph);
        assert_eq!(path.nodes(), &[input, output]);
        assert!(path.is_complete());
        assert!(path.intermediate().is_empty());
    }

    #[test]
    fn test_chain_through_transforms() {
        let mut graph = GraphStore::new();
        let (input, output) = (graph.input_id(), graph.output_id());
        let resize = graph.add_node(ModuleKind::Resize, Position::default()).unwrap();
        let blur = graph.add_node(ModuleKind::Blur, Position::default()).unwrap();
        connect(&mut graph, input, resize);
        connect(&mut graph, resize, blur);
        connect(&mut graph, blur, output);

        let path = resolve_path(&graph);
        assert!(path.is_complete());
        assert_eq!(path.intermediate(), &[resize, blur]);
    }

    #[test]
    fn test_disconnected_branch_is_ignored() {
        let mut graph = GraphStore::new();
        let (input, output) = (graph.input_id(), graph.output_id());
        connect(&mut graph, input, output);
        let before = resolve_path(&graph);

        let a = graph.add_node(ModuleKind::Flip, Position::default()).unwrap();
        let b = graph.add_node(ModuleKind::Crop, Position::default()).unwrap();
        connect(&mut graph, a, b);

        assert_eq!(resolve_path(&graph), before);
    }

    #[test]
    fn test_cycle_stops_walk() {
        let mut graph = GraphStore::new();
        let input = graph.input_id();
        let a = graph.add_node(ModuleKind::Rotate, Position::default()).unwrap();
        let b = graph.add_node(ModuleKind::Opacity, Position::default()).unwrap();
        connect(&mut graph, input, a);
        connect(&mut graph, a, b);
        connect(&mut graph, b, a);

        let path = resolve_path(&graph);
        assert_eq!(path.nodes(), &[input, a, b]);
        assert!(!path.is_complete());
    }
}

use log::debug;

use super::editor_service::EditorSession;
use super::frontend::Frontend;
use super::history::HistoryItem;
use crate::error::LibraryError;
use crate::model::project::arena::{LinkId, NodeId, PortId};
use crate::plugin::ModuleKind;

/// Graph node operations.
impl<F: Frontend> EditorSession<F> {
    /// Adds a node with default settings at the frontend's next free position.
    pub fn add_node(&mut self, kind: ModuleKind) -> Result<NodeId, LibraryError> {
        let position = self.frontend.free_position(&self.graph);
        let id = self.graph.add_node(kind, position)?;
        self.record_created(id)?;
        self.rerender();
        Ok(id)
    }

    /// Deletes a node and its links. Input and Output are left alone.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), LibraryError> {
        self.delete_node(id)?;
        self.rerender();
        Ok(())
    }

    /// Links an output port to an input port, replacing the port's previous link.
    pub fn connect(&mut self, source: PortId, target: PortId) -> Result<LinkId, LibraryError> {
        let outcome = match self.graph.add_link(source, target) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail("Invalid connection", e)),
        };
        let link = self
            .graph
            .link(outcome.id)
            .and_then(|link| self.graph.link_ends(link))
            .ok_or(LibraryError::LinkNotFound)?;
        let replaced = outcome
            .replaced
            .as_ref()
            .and_then(|link| self.graph.link_ends(link));
        self.history.append(HistoryItem::link_create(link, replaced));
        self.rerender();
        Ok(outcome.id)
    }

    pub fn disconnect(&mut self, id: LinkId) -> Result<(), LibraryError> {
        self.delete_link(id)?;
        self.rerender();
        Ok(())
    }

    /// Deletes the selected nodes, then the selected links that are still present.
    ///
    /// Each deletion is its own history item.
    pub fn delete_selected(&mut self) -> Result<(), LibraryError> {
        for id in self.frontend.selected_nodes() {
            if self.graph.node(id).is_some() {
                self.delete_node(id)?;
            }
        }
        for id in self.frontend.selected_links() {
            if self.graph.link(id).is_some() {
                self.delete_link(id)?;
            }
        }
        self.rerender();
        Ok(())
    }

    /// Copies each selected node with its settings, offset from the original.
    pub fn duplicate_selected(&mut self) -> Result<Vec<NodeId>, LibraryError> {
        let mut created = Vec::new();
        for id in self.frontend.selected_nodes() {
            let Some(node) = self.graph.node(id) else {
                continue;
            };
            if node.is_protected() {
                continue;
            }
            let mut snapshot = node.snapshot();
            snapshot.alias.clear();
            snapshot.position = self.config.duplicate_position(node.position);

            let copy = self.graph.insert_snapshot(&snapshot)?;
            self.record_created(copy)?;
            created.push(copy);
        }
        self.rerender();
        Ok(created)
    }

    fn record_created(&mut self, id: NodeId) -> Result<(), LibraryError> {
        let snapshot = self
            .graph
            .node(id)
            .map(|node| node.snapshot())
            .ok_or_else(|| LibraryError::node_not_found(id.to_string()))?;
        self.history.append(HistoryItem::node_create(snapshot));
        Ok(())
    }

    fn delete_node(&mut self, id: NodeId) -> Result<(), LibraryError> {
        let node = self
            .graph
            .node(id)
            .ok_or_else(|| LibraryError::node_not_found(id.to_string()))?;
        if node.is_protected() {
            debug!("Ignoring delete of protected node {}", node.alias);
            return Ok(());
        }
        let removed = self.graph.remove_node(id)?;
        self.history
            .append(HistoryItem::node_delete(removed.snapshot, removed.links));
        Ok(())
    }

    fn delete_link(&mut self, id: LinkId) -> Result<(), LibraryError> {
        let ends = self
            .graph
            .link(id)
            .and_then(|link| self.graph.link_ends(link))
            .ok_or(LibraryError::LinkNotFound)?;
        self.graph.remove_link(id);
        self.history.append(HistoryItem::link_delete(ends));
        Ok(())
    }
}

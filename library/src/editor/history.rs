//! Undo/redo of graph edits.
//!
//! Items name their subjects by alias rather than by id, so an item stays valid after
//! the node it targets has been deleted and re-created by an earlier undo.

use log::{debug, warn};

use crate::error::LibraryError;
use crate::model::project::connection::{LinkEnds, LinkOutcome};
use crate::model::project::graph::GraphStore;
use crate::model::project::graph_node::NodeSnapshot;
use crate::model::project::property::SettingValue;

#[derive(Clone, Debug, PartialEq)]
pub enum HistoryAction {
    SettingsUpdate {
        key: String,
        old: SettingValue,
        new: SettingValue,
    },
    NodeCreate {
        snapshot: NodeSnapshot,
    },
    /// The deleted node and the links it took with it.
    NodeDelete {
        snapshot: NodeSnapshot,
        links: Vec<LinkEnds>,
    },
    /// `replaced` is the link that used to leave the same output port.
    LinkCreate {
        link: LinkEnds,
        replaced: Option<LinkEnds>,
    },
    LinkDelete {
        link: LinkEnds,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryItem {
    /// Alias of the node the action targets, or `source->target` for links
    pub subject: String,
    pub action: HistoryAction,
}

impl HistoryItem {
    pub fn settings_update(alias: &str, key: &str, old: SettingValue, new: SettingValue) -> Self {
        Self {
            subject: alias.to_string(),
            action: HistoryAction::SettingsUpdate {
                key: key.to_string(),
                old,
                new,
            },
        }
    }

    pub fn node_create(snapshot: NodeSnapshot) -> Self {
        Self {
            subject: snapshot.alias.clone(),
            action: HistoryAction::NodeCreate { snapshot },
        }
    }

    pub fn node_delete(snapshot: NodeSnapshot, links: Vec<LinkEnds>) -> Self {
        Self {
            subject: snapshot.alias.clone(),
            action: HistoryAction::NodeDelete { snapshot, links },
        }
    }

    pub fn link_create(link: LinkEnds, replaced: Option<LinkEnds>) -> Self {
        Self {
            subject: link.to_string(),
            action: HistoryAction::LinkCreate { link, replaced },
        }
    }

    pub fn link_delete(link: LinkEnds) -> Self {
        Self {
            subject: link.to_string(),
            action: HistoryAction::LinkDelete { link },
        }
    }

    /// Applies the inverse of the action. On error the graph is left as it was.
    pub fn undo(&self, graph: &mut GraphStore) -> Result<(), LibraryError> {
        match &self.action {
            HistoryAction::SettingsUpdate { key, old, .. } => {
                self.apply_setting(graph, key, *old)
            }
            HistoryAction::NodeCreate { snapshot } => remove_by_alias(graph, &snapshot.alias),
            HistoryAction::NodeDelete { snapshot, links } => {
                let id = graph.insert_snapshot(snapshot)?;
                let mut made = Vec::with_capacity(links.len());
                for ends in links {
                    match graph.connect_ends(ends) {
                        Ok(outcome) => made.push(outcome),
                        Err(e) => {
                            rollback_links(graph, made);
                            graph.remove_node(id)?;
                            return Err(e);
                        }
                    }
                }
                Ok(())
            }
            HistoryAction::LinkCreate { link, replaced } => {
                let id = graph.find_link(link).ok_or(LibraryError::LinkNotFound)?;
                let previous = replaced
                    .as_ref()
                    .map(|ends| graph.resolve_ends(ends))
                    .transpose()?;
                let removed = graph.remove_link(id).ok_or(LibraryError::LinkNotFound)?;
                if let Some((source, target)) = previous {
                    if let Err(e) = graph.add_link(source, target) {
                        graph.add_link(removed.source, removed.target)?;
                        return Err(e);
                    }
                }
                Ok(())
            }
            HistoryAction::LinkDelete { link } => graph.connect_ends(link).map(|_| ()),
        }
    }

    /// Applies the action again.
    pub fn redo(&self, graph: &mut GraphStore) -> Result<(), LibraryError> {
        match &self.action {
            HistoryAction::SettingsUpdate { key, new, .. } => {
                self.apply_setting(graph, key, *new)
            }
            HistoryAction::NodeCreate { snapshot } => graph.insert_snapshot(snapshot).map(|_| ()),
            HistoryAction::NodeDelete { snapshot, .. } => remove_by_alias(graph, &snapshot.alias),
            HistoryAction::LinkCreate { link, .. } => graph.connect_ends(link).map(|_| ()),
            HistoryAction::LinkDelete { link } => remove_link(graph, link),
        }
    }

    fn apply_setting(
        &self,
        graph: &mut GraphStore,
        key: &str,
        value: SettingValue,
    ) -> Result<(), LibraryError> {
        let id = graph
            .node_by_alias(&self.subject)
            .ok_or_else(|| LibraryError::node_not_found(&self.subject))?;
        graph.set_setting(id, key, value).map(|_| ())
    }
}

fn remove_by_alias(graph: &mut GraphStore, alias: &str) -> Result<(), LibraryError> {
    let id = graph
        .node_by_alias(alias)
        .ok_or_else(|| LibraryError::node_not_found(alias))?;
    graph.remove_node(id).map(|_| ())
}

/// Undoes links made by a partially applied step, newest first.
fn rollback_links(graph: &mut GraphStore, made: Vec<LinkOutcome>) {
    for outcome in made.into_iter().rev() {
        graph.remove_link(outcome.id);
        if let Some(previous) = outcome.replaced {
            if let Err(e) = graph.add_link(previous.source, previous.target) {
                warn!("Could not restore link {}: {}", previous.id, e);
            }
        }
    }
}

fn remove_link(graph: &mut GraphStore, ends: &LinkEnds) -> Result<(), LibraryError> {
    let id = graph.find_link(ends).ok_or(LibraryError::LinkNotFound)?;
    graph.remove_link(id).ok_or(LibraryError::LinkNotFound)?;
    Ok(())
}

/// Two stacks of reversible edits. A new edit discards everything that was undone.
#[derive(Debug, Default)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryItem>,
    redo_stack: Vec<HistoryItem>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an edit onto the undo stack. Clears the redo stack.
    pub fn append(&mut self, item: HistoryItem) {
        debug!("History: recorded {:?} on {}", item.action, item.subject);
        self.undo_stack.push(item);
        self.redo_stack.clear();
    }

    /// Reverts the most recent edit. Returns `Ok(false)` when there is nothing to undo.
    ///
    /// An item that can no longer be applied is dropped from both stacks.
    pub fn undo(&mut self, graph: &mut GraphStore) -> Result<bool, LibraryError> {
        let Some(item) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match item.undo(graph) {
            Ok(()) => {
                debug!("History: undid {}", item.subject);
                self.redo_stack.push(item);
                Ok(true)
            }
            Err(e) => {
                warn!("Dropping history item for {}: {}", item.subject, e);
                Err(LibraryError::history(format!("undo of {} failed: {}", item.subject, e)))
            }
        }
    }

    /// Re-applies the most recently undone edit. Returns `Ok(false)` when there is none.
    pub fn redo(&mut self, graph: &mut GraphStore) -> Result<bool, LibraryError> {
        let Some(item) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match item.redo(graph) {
            Ok(()) => {
                debug!("History: redid {}", item.subject);
                self.undo_stack.push(item);
                Ok(true)
            }
            Err(e) => {
                warn!("Dropping history item for {}: {}", item.subject, e);
                Err(LibraryError::history(format!("redo of {} failed: {}", item.subject, e)))
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn peek_undo(&self) -> Option<&HistoryItem> {
        self.undo_stack.last()
    }

    pub fn peek_redo(&self) -> Option<&HistoryItem> {
        self.redo_stack.last()
    }
}

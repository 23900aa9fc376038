//! The graph store: single owner of every node, port and link of a session.

use image::RgbaImage;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::arena::{Arena, ArenaId, LinkId, NodeId, PortId};
use super::connection::{Link, LinkEnds, LinkOutcome, Port, PortDirection};
use super::graph_node::{Node, NodeData, NodeSnapshot, Position};
use super::property::{SettingValue, Settings};
use crate::error::LibraryError;
use crate::plugin::ModuleKind;

pub const INPUT_ALIAS: &str = "Input";
pub const OUTPUT_ALIAS: &str = "Output";

const INPUT_POSITION: Position = Position::new(50.0, 100.0);
const OUTPUT_POSITION: Position = Position::new(1100.0, 100.0);

/// A node removed from the store together with the links that touched it.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedNode {
    pub snapshot: NodeSnapshot,
    pub links: Vec<LinkEnds>,
}

#[derive(Debug)]
pub struct GraphStore {
    nodes: Arena<NodeId, Node>,
    ports: Arena<PortId, Port>,
    links: Arena<LinkId, Link>,
    /// Source port -> the single link leaving it
    outgoing: HashMap<PortId, LinkId>,
    counters: HashMap<ModuleKind, u32>,
    input: NodeId,
    output: NodeId,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// A store holding only the Input and Output nodes.
    pub fn new() -> Self {
        let mut store = Self {
            nodes: Arena::new(),
            ports: Arena::new(),
            links: Arena::new(),
            outgoing: HashMap::new(),
            counters: HashMap::new(),
            input: NodeId::from_parts(0, 0),
            output: NodeId::from_parts(0, 0),
        };
        store.spawn_singletons();
        store
    }

    fn spawn_singletons(&mut self) {
        self.input = self.spawn(
            ModuleKind::Input,
            INPUT_ALIAS.to_string(),
            ModuleKind::Input.default_settings(),
            INPUT_POSITION,
        );
        self.output = self.spawn(
            ModuleKind::Output,
            OUTPUT_ALIAS.to_string(),
            ModuleKind::Output.default_settings(),
            OUTPUT_POSITION,
        );
    }

    fn spawn(
        &mut self,
        kind: ModuleKind,
        alias: String,
        settings: Settings,
        position: Position,
    ) -> NodeId {
        let id = self.nodes.insert_with(|id| Node {
            id,
            kind,
            alias,
            settings,
            position,
            input_port: None,
            output_port: None,
            data: NodeData::for_kind(kind),
        });

        let input_port = kind.has_input_port().then(|| {
            self.ports.insert_with(|port| Port {
                id: port,
                node: id,
                direction: PortDirection::Input,
            })
        });
        let output_port = kind.has_output_port().then(|| {
            self.ports.insert_with(|port| Port {
                id: port,
                node: id,
                direction: PortDirection::Output,
            })
        });

        if let Some(node) = self.nodes.get_mut(id) {
            node.input_port = input_port;
            node.output_port = output_port;
        }
        id
    }

    fn next_alias(&mut self, kind: ModuleKind) -> String {
        loop {
            let counter = self.counters.entry(kind).or_insert(0);
            let alias = format!("{}_{}", kind.alias_prefix(), counter);
            *counter += 1;
            if self.node_by_alias(&alias).is_none() {
                return alias;
            }
        }
    }

    /// Keeps generated aliases clear of one that was restored explicitly.
    fn reserve_alias(&mut self, kind: ModuleKind, alias: &str) {
        let number = alias
            .rsplit_once('_')
            .and_then(|(_, n)| n.parse::<u32>().ok());
        if let Some(n) = number {
            let counter = self.counters.entry(kind).or_insert(0);
            *counter = (*counter).max(n + 1);
        }
    }

    /// Instantiates a node of `kind` with default settings.
    pub fn add_node(&mut self, kind: ModuleKind, position: Position) -> Result<NodeId, LibraryError> {
        if kind.is_protected() {
            return Err(LibraryError::ProtectedNode(kind.name().to_string()));
        }
        let alias = self.next_alias(kind);
        let id = self.spawn(kind, alias, kind.default_settings(), position);
        debug!("Added node {} ({})", self.alias_of(id).unwrap_or("?"), id);
        Ok(id)
    }

    /// Like [`add_node`](Self::add_node), resolving the kind by name.
    pub fn add_node_named(&mut self, name: &str, position: Position) -> Result<NodeId, LibraryError> {
        let kind = ModuleKind::from_name(name)?;
        self.add_node(kind, position)
    }

    /// Re-creates a node from a snapshot, keeping its alias when it is free.
    /// An empty alias gets a fresh one.
    pub fn insert_snapshot(&mut self, snapshot: &NodeSnapshot) -> Result<NodeId, LibraryError> {
        let kind = snapshot.kind;
        if kind.is_protected() {
            return Err(LibraryError::ProtectedNode(snapshot.alias.clone()));
        }

        let alias = if snapshot.alias.is_empty() {
            self.next_alias(kind)
        } else if self.node_by_alias(&snapshot.alias).is_some() {
            let fresh = self.next_alias(kind);
            warn!("Alias {} is taken, restoring node as {}", snapshot.alias, fresh);
            fresh
        } else {
            self.reserve_alias(kind, &snapshot.alias);
            snapshot.alias.clone()
        };

        // Start from defaults so settings added to a kind later are present
        let mut settings = kind.default_settings();
        for (key, value) in snapshot.settings.iter() {
            match kind.validate_setting(key, *value) {
                Ok(value) => {
                    settings.set(key, value);
                }
                Err(e) => debug!("Dropping setting of {}: {}", snapshot.alias, e),
            }
        }

        let id = self.spawn(kind, alias, settings, snapshot.position);
        debug!("Restored node {} ({})", self.alias_of(id).unwrap_or("?"), id);
        Ok(id)
    }

    /// Removes a node and every link incident to it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, LibraryError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| LibraryError::node_not_found(id.to_string()))?;
        if node.is_protected() {
            return Err(LibraryError::ProtectedNode(node.alias.clone()));
        }

        let mut links = Vec::new();
        for link_id in self.links_touching(id) {
            if let Some(ends) = self.link(link_id).and_then(|l| self.link_ends(l)) {
                links.push(ends);
            }
            self.remove_link(link_id);
        }

        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| LibraryError::node_not_found(id.to_string()))?;
        for port in [node.input_port, node.output_port].into_iter().flatten() {
            self.ports.remove(port);
        }
        debug!("Removed node {} with {} link(s)", node.alias, links.len());

        Ok(RemovedNode {
            snapshot: node.snapshot(),
            links,
        })
    }

    /// Connects `source` (an output port) to `target` (an input port).
    ///
    /// A link already leaving `source` is removed first and returned in the outcome.
    pub fn add_link(&mut self, source: PortId, target: PortId) -> Result<LinkOutcome, LibraryError> {
        let source_port = self.ports.get(source).ok_or(LibraryError::PortNotFound)?;
        let target_port = self.ports.get(target).ok_or(LibraryError::PortNotFound)?;

        if source_port.direction != PortDirection::Output {
            return Err(LibraryError::invalid_link("source must be an output port"));
        }
        if target_port.direction != PortDirection::Input {
            return Err(LibraryError::invalid_link("target must be an input port"));
        }
        if source_port.node == target_port.node {
            return Err(LibraryError::invalid_link("Cannot connect a node to itself"));
        }

        let replaced = match self.outgoing.get(&source).copied() {
            Some(previous) => self.remove_link(previous),
            None => None,
        };

        let id = self.links.insert_with(|id| Link { id, source, target });
        self.outgoing.insert(source, id);
        debug!("Added link {} ({} -> {})", id, source, target);

        Ok(LinkOutcome { id, replaced })
    }

    /// Removes a link. Unknown ids are ignored.
    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.remove(id)?;
        if self.outgoing.get(&link.source) == Some(&id) {
            self.outgoing.remove(&link.source);
        }
        debug!("Removed link {}", id);
        Some(link)
    }

    /// Output port of `ends.source` and input port of `ends.target`.
    pub fn resolve_ends(&self, ends: &LinkEnds) -> Result<(PortId, PortId), LibraryError> {
        let source = self
            .node_by_alias(&ends.source)
            .and_then(|id| self.node(id))
            .ok_or_else(|| LibraryError::node_not_found(&ends.source))?
            .output_port
            .ok_or(LibraryError::PortNotFound)?;
        let target = self
            .node_by_alias(&ends.target)
            .and_then(|id| self.node(id))
            .ok_or_else(|| LibraryError::node_not_found(&ends.target))?
            .input_port
            .ok_or(LibraryError::PortNotFound)?;
        Ok((source, target))
    }

    /// Connects two nodes named by alias, output port to input port.
    pub fn connect_ends(&mut self, ends: &LinkEnds) -> Result<LinkOutcome, LibraryError> {
        let (source, target) = self.resolve_ends(ends)?;
        self.add_link(source, target)
    }

    /// Finds the link joining the two aliased nodes, if any.
    pub fn find_link(&self, ends: &LinkEnds) -> Option<LinkId> {
        let source = self.node(self.node_by_alias(&ends.source)?)?.output_port?;
        let link = self.link_from(source)?;
        let target_node = self.port(link.target)?.node;
        (self.alias_of(target_node)? == ends.target).then_some(link.id)
    }

    pub fn link_ends(&self, link: &Link) -> Option<LinkEnds> {
        let source = self.alias_of(self.port(link.source)?.node)?;
        let target = self.alias_of(self.port(link.target)?.node)?;
        Some(LinkEnds::new(source, target))
    }

    /// Stores a setting and returns the value it replaced.
    ///
    /// The value must match the type of the parameter's default. Numbers are clamped
    /// into the parameter's range, so the stored value can differ from `value`.
    pub fn set_setting(
        &mut self,
        id: NodeId,
        key: &str,
        value: SettingValue,
    ) -> Result<SettingValue, LibraryError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| LibraryError::node_not_found(id.to_string()))?;
        let value = node.kind.validate_setting(key, value)?;
        let old = match node.settings.set(key, value) {
            Some(old) => old,
            None => node
                .kind
                .default_settings()
                .get(key)
                .copied()
                .unwrap_or(value),
        };
        debug!("{}.{}: {} -> {}", node.alias, key, old, value);
        Ok(old)
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> Option<()> {
        self.node_mut(id)?.position = position;
        Some(())
    }

    /// Drops every node except Input and Output. The loaded source image survives.
    pub fn reset(&mut self) {
        let input_data = self
            .nodes
            .get_mut(self.input)
            .map(|node| std::mem::take(&mut node.data));

        self.links.clear();
        self.outgoing.clear();
        self.ports.clear();
        self.nodes.clear();
        self.counters.clear();
        self.spawn_singletons();

        if let Some(data) = input_data {
            if let Some(node) = self.nodes.get_mut(self.input) {
                node.data = data;
            }
        }
        debug!("Graph reset");
    }

    // --- Input / Output payloads ---

    pub fn set_source_image(&mut self, image: RgbaImage, path: Option<PathBuf>) {
        if let Some(node) = self.nodes.get_mut(self.input) {
            node.data = NodeData::Input {
                image: Some(image),
                image_path: path,
            };
        }
    }

    pub fn clear_source_image(&mut self) {
        if let Some(node) = self.nodes.get_mut(self.input) {
            node.data = NodeData::for_kind(ModuleKind::Input);
        }
    }

    pub fn source_image(&self) -> Option<&RgbaImage> {
        match &self.nodes.get(self.input)?.data {
            NodeData::Input { image, .. } => image.as_ref(),
            _ => None,
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        match &self.nodes.get(self.input)?.data {
            NodeData::Input { image_path, .. } => image_path.as_deref(),
            _ => None,
        }
    }

    pub fn set_output(&mut self, image: RgbaImage, preview: RgbaImage) {
        if let Some(node) = self.nodes.get_mut(self.output) {
            node.data = NodeData::Output {
                image: Some(image),
                preview: Some(preview),
            };
        }
    }

    pub fn clear_output(&mut self) {
        if let Some(node) = self.nodes.get_mut(self.output) {
            node.data = NodeData::for_kind(ModuleKind::Output);
        }
    }

    pub fn output_image(&self) -> Option<&RgbaImage> {
        match &self.nodes.get(self.output)?.data {
            NodeData::Output { image, .. } => image.as_ref(),
            _ => None,
        }
    }

    pub fn output_preview(&self) -> Option<&RgbaImage> {
        match &self.nodes.get(self.output)?.data {
            NodeData::Output { preview, .. } => preview.as_ref(),
            _ => None,
        }
    }

    // --- Lookups ---

    pub fn input_id(&self) -> NodeId {
        self.input
    }

    pub fn output_id(&self) -> NodeId {
        self.output
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access for display state. Ports and alias must not be changed through it.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node_by_alias(&self, alias: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.alias == alias)
            .map(|(id, _)| id)
    }

    pub fn alias_of(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|node| node.alias.as_str())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The single link leaving `port`, if any.
    pub fn link_from(&self, port: PortId) -> Option<&Link> {
        self.outgoing.get(&port).and_then(|id| self.links.get(*id))
    }

    /// Links whose source or target belongs to `node`.
    pub fn links_touching(&self, node: NodeId) -> Vec<LinkId> {
        let Some(node) = self.nodes.get(node) else {
            return Vec::new();
        };
        let ports = [node.input_port, node.output_port];
        self.links
            .values()
            .filter(|link| ports.contains(&Some(link.source)) || ports.contains(&Some(link.target)))
            .map(|link| link.id)
            .collect()
    }

    /// Node reached by following the link out of `node`'s output port.
    pub fn next_node(&self, node: NodeId) -> Option<NodeId> {
        let port = self.nodes.get(node)?.output_port?;
        let link = self.link_from(port)?;
        Some(self.ports.get(link.target)?.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(store: &GraphStore, id: NodeId) -> (Option<PortId>, Option<PortId>) {
        let node = store.node(id).unwrap();
        (node.input_port, node.output_port)
    }

    #[test]
    fn test_new_store_has_singletons() {
        let store = GraphStore::new();
        assert_eq!(store.node_count(), 2);
        let (input_in, input_out) = ports(&store, store.input_id());
        let (output_in, output_out) = ports(&store, store.output_id());
        assert!(input_in.is_none() && input_out.is_some());
        assert!(output_in.is_some() && output_out.is_none());
    }

    #[test]
    fn test_aliases_count_per_kind() {
        let mut store = GraphStore::new();
        let a = store.add_node(ModuleKind::Resize, Position::default()).unwrap();
        let b = store.add_node(ModuleKind::Resize, Position::default()).unwrap();
        let c = store.add_node(ModuleKind::Blur, Position::default()).unwrap();
        assert_eq!(store.alias_of(a), Some("resize_0"));
        assert_eq!(store.alias_of(b), Some("resize_1"));
        assert_eq!(store.alias_of(c), Some("blur_0"));
    }

    #[test]
    fn test_singleton_kinds_cannot_be_added() {
        let mut store = GraphStore::new();
        assert!(matches!(
            store.add_node(ModuleKind::Output, Position::default()),
            Err(LibraryError::ProtectedNode(_))
        ));
        assert!(matches!(
            store.add_node_named("Sepia", Position::default()),
            Err(LibraryError::UnknownModuleKind(_))
        ));
    }

    #[test]
    fn test_link_direction_is_validated() {
        let mut store = GraphStore::new();
        let blur = store.add_node(ModuleKind::Blur, Position::default()).unwrap();
        let (blur_in, blur_out) = ports(&store, blur);
        let (_, input_out) = ports(&store, store.input_id());

        assert!(matches!(
            store.add_link(blur_in.unwrap(), blur_out.unwrap()),
            Err(LibraryError::InvalidLink(_))
        ));
        assert!(matches!(
            store.add_link(blur_out.unwrap(), blur_in.unwrap()),
            Err(LibraryError::InvalidLink(_))
        ));
        assert!(store.add_link(input_out.unwrap(), blur_in.unwrap()).is_ok());
    }

    #[test]
    fn test_set_setting_returns_previous_value() {
        let mut store = GraphStore::new();
        let resize = store.add_node(ModuleKind::Resize, Position::default()).unwrap();
        let old = store.set_setting(resize, "width", SettingValue::Integer(50)).unwrap();
        assert_eq!(old, SettingValue::Integer(100));
        assert!(matches!(
            store.set_setting(resize, "radius", SettingValue::Integer(1)),
            Err(LibraryError::UnknownSetting { .. })
        ));
    }

    #[test]
    fn test_set_setting_validates_value() {
        let mut store = GraphStore::new();
        let resize = store.add_node(ModuleKind::Resize, Position::default()).unwrap();
        assert!(matches!(
            store.set_setting(resize, "keep_aspect", SettingValue::Integer(7)),
            Err(LibraryError::InvalidSettingValue { .. })
        ));
        let settings = &store.node(resize).unwrap().settings;
        assert_eq!(settings.get_bool("keep_aspect"), Some(true));

        store.set_setting(resize, "width", SettingValue::from(1e12)).unwrap();
        let settings = &store.node(resize).unwrap().settings;
        assert_eq!(settings.get_i64("width"), Some(1000));
    }

    #[test]
    fn test_insert_snapshot_drops_invalid_settings() {
        let mut store = GraphStore::new();
        let snapshot = NodeSnapshot {
            kind: ModuleKind::Blur,
            alias: String::new(),
            settings: Settings::new().with("radius", true),
            position: Position::default(),
        };
        let id = store.insert_snapshot(&snapshot).unwrap();
        assert_eq!(store.node(id).unwrap().settings.get_i64("radius"), Some(0));
    }

    #[test]
    fn test_reset_keeps_source_image() {
        let mut store = GraphStore::new();
        store.set_source_image(RgbaImage::new(3, 2), Some(PathBuf::from("a.png")));
        store.add_node(ModuleKind::Flip, Position::default()).unwrap();
        store.reset();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.source_image().map(|i| i.dimensions()), Some((3, 2)));
        assert_eq!(store.source_path(), Some(Path::new("a.png")));
    }

    #[test]
    fn test_insert_snapshot_reserves_alias_number() {
        let mut store = GraphStore::new();
        let snapshot = NodeSnapshot {
            kind: ModuleKind::Rotate,
            alias: "rotate_4".to_string(),
            settings: ModuleKind::Rotate.default_settings(),
            position: Position::new(1.0, 2.0),
        };
        store.insert_snapshot(&snapshot).unwrap();
        let next = store.add_node(ModuleKind::Rotate, Position::default()).unwrap();
        assert_eq!(store.alias_of(next), Some("rotate_5"));
    }
}

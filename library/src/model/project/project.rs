//! Project file (`.cresliant`) record and its mapping onto the graph store.
//!
//! Links are stored by the *kind names* of the nodes they join, not by alias. On load
//! each link attaches to the first restored node of the matching kind, so a project
//! holding two nodes of the same kind in different chain positions cannot be
//! reconnected faithfully.
//!
//! Node entries are keyed by alias and kept sorted, so restore orders them by kind
//! prefix and then by the numeric alias suffix (`resize_2` before `resize_10`). The
//! first node of a kind is therefore the earliest created one.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::arena::NodeId;
use super::graph::GraphStore;
use super::graph_node::{NodeSnapshot, Position};
use super::property::Settings;
use crate::error::LibraryError;
use crate::loader::image::load_image;
use crate::plugin::ModuleKind;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProjectRecord {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub image: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeRecord {
    #[serde(alias = "pos")]
    pub position: Position,
    #[serde(default)]
    pub settings: RecordSettings,
}

/// Settings of a node entry.
///
/// Older files nest the settings of every node of a kind under their aliases; only
/// the entry's own alias is read from those.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RecordSettings {
    Flat(Settings),
    Nested(BTreeMap<String, Settings>),
}

impl Default for RecordSettings {
    fn default() -> Self {
        RecordSettings::Flat(Settings::new())
    }
}

impl RecordSettings {
    fn for_alias(&self, alias: &str) -> Settings {
        match self {
            RecordSettings::Flat(settings) => settings.clone(),
            RecordSettings::Nested(by_alias) => by_alias.get(alias).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkRecord {
    /// Kind name of the upstream node
    pub source: String,
    /// Kind name of the downstream node
    pub target: String,
}

/// What [`ProjectRecord::restore`] created and what it had to skip.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Restored nodes in creation order, including the singletons found in the record.
    pub nodes: Vec<NodeId>,
    pub links_restored: usize,
    pub skipped_links: Vec<LinkRecord>,
    /// Errors recovered locally: unknown kinds and a missing source image.
    pub recovered: Vec<LibraryError>,
}

impl RestoreReport {
    pub fn source_image_missing(&self) -> bool {
        self.recovered
            .iter()
            .any(|e| matches!(e, LibraryError::SourceImageMissing(_)))
    }
}

/// Restore order of an alias: kind prefix, then numeric suffix.
fn alias_order(alias: &str) -> (&str, u64, &str) {
    match alias.rsplit_once('_') {
        Some((prefix, n)) => match n.parse::<u64>() {
            Ok(n) => (prefix, n, alias),
            Err(_) => (alias, 0, alias),
        },
        None => (alias, 0, alias),
    }
}

/// Kind named by an alias: the part before the first `_`, or the whole alias.
fn kind_of_alias(alias: &str) -> Result<ModuleKind, LibraryError> {
    let name = alias.split('_').next().unwrap_or(alias);
    ModuleKind::from_name(name)
}

impl ProjectRecord {
    /// Captures the live graph.
    pub fn capture(graph: &GraphStore) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| {
                (
                    node.alias.clone(),
                    NodeRecord {
                        position: node.position,
                        settings: RecordSettings::Flat(node.settings.clone()),
                    },
                )
            })
            .collect();

        let links = graph
            .links()
            .filter_map(|link| {
                let source = graph.node(graph.port(link.source)?.node)?;
                let target = graph.node(graph.port(link.target)?.node)?;
                Some(LinkRecord {
                    source: source.kind.name().to_string(),
                    target: target.kind.name().to_string(),
                })
            })
            .collect();

        Self {
            nodes,
            links,
            image: graph.source_path().map(Path::to_path_buf),
        }
    }

    /// Replaces the contents of `graph` with this record.
    ///
    /// A relative image path is resolved against `base_dir` when given.
    pub fn restore(&self, graph: &mut GraphStore, base_dir: Option<&Path>) -> RestoreReport {
        let mut report = RestoreReport::default();
        graph.reset();
        graph.clear_source_image();

        let mut entries: Vec<_> = self.nodes.iter().collect();
        entries.sort_by(|a, b| alias_order(a.0).cmp(&alias_order(b.0)));

        let mut created: Vec<(ModuleKind, NodeId)> = Vec::new();
        for (alias, entry) in entries {
            let kind = match kind_of_alias(alias) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Skipping node {}: {}", alias, e);
                    report.recovered.push(e);
                    continue;
                }
            };

            let mut settings = Settings::new();
            for (key, value) in entry.settings.for_alias(alias).iter() {
                let Some(param) = kind.normalize_setting_key(key) else {
                    debug!("Ignoring unknown setting {} on {}", key, alias);
                    continue;
                };
                match kind.validate_setting(&param, *value) {
                    Ok(value) => {
                        settings.set(&param, value);
                    }
                    Err(e) => warn!("Ignoring setting of {}: {}", alias, e),
                }
            }

            let id = match kind {
                ModuleKind::Input => graph.input_id(),
                ModuleKind::Output => graph.output_id(),
                _ => {
                    let snapshot = NodeSnapshot {
                        kind,
                        // Renumbered in load order
                        alias: String::new(),
                        settings,
                        position: entry.position,
                    };
                    match graph.insert_snapshot(&snapshot) {
                        Ok(id) => id,
                        Err(e) => {
                            warn!("Skipping node {}: {}", alias, e);
                            report.recovered.push(e);
                            continue;
                        }
                    }
                }
            };
            graph.set_position(id, entry.position);
            created.push((kind, id));
        }

        for record in &self.links {
            match self.restore_link(graph, &created, record) {
                Ok(()) => report.links_restored += 1,
                Err(e) => {
                    debug!("Skipping link {} -> {}: {}", record.source, record.target, e);
                    report.skipped_links.push(record.clone());
                }
            }
        }

        if let Some(path) = &self.image {
            let resolved = match base_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path.clone(),
            };
            match load_image(&resolved) {
                Ok(image) => graph.set_source_image(image, Some(resolved)),
                Err(e) => {
                    warn!("Could not load source image {}: {}", resolved.display(), e);
                    report
                        .recovered
                        .push(LibraryError::SourceImageMissing(resolved));
                }
            }
        }

        report.nodes = created.into_iter().map(|(_, id)| id).collect();
        info!(
            "Restored {} node(s), {} link(s)",
            report.nodes.len(),
            report.links_restored
        );
        report
    }

    fn restore_link(
        &self,
        graph: &mut GraphStore,
        created: &[(ModuleKind, NodeId)],
        record: &LinkRecord,
    ) -> Result<(), LibraryError> {
        let source_kind = ModuleKind::from_name(&record.source)?;
        let target_kind = ModuleKind::from_name(&record.target)?;

        let first_of = |kind: ModuleKind| {
            created
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, id)| *id)
                .or(match kind {
                    ModuleKind::Input => Some(graph.input_id()),
                    ModuleKind::Output => Some(graph.output_id()),
                    _ => None,
                })
                .ok_or_else(|| LibraryError::node_not_found(kind.name()))
        };
        let source = first_of(source_kind)?;
        let target = first_of(target_kind)?;

        let source_port = graph
            .node(source)
            .and_then(|n| n.output_port)
            .ok_or(LibraryError::PortNotFound)?;
        let target_port = graph
            .node(target)
            .and_then(|n| n.input_port)
            .ok_or(LibraryError::PortNotFound)?;
        graph.add_link(source_port, target_port)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read_from(path: &Path) -> Result<Self, LibraryError> {
        let json = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LibraryError::ProjectNotFound(path.to_path_buf()),
            _ => LibraryError::Io(e),
        })?;
        Self::from_json(&json)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LibraryError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|_| LibraryError::InvalidLocation(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::graph::{INPUT_ALIAS, OUTPUT_ALIAS};

    #[test]
    fn test_kind_of_alias() {
        assert_eq!(kind_of_alias("resize_3").unwrap(), ModuleKind::Resize);
        assert_eq!(kind_of_alias("Input").unwrap(), ModuleKind::Input);
        assert!(kind_of_alias("vignette_0").is_err());
    }

    #[test]
    fn test_nested_legacy_settings_parse() {
        let json = r#"{
            "nodes": {
                "sharpness_0": {
                    "pos": [10, 20],
                    "settings": { "sharpness_0": { "sharpness_percentage_0": 40 } }
                }
            },
            "links": [],
            "image": null
        }"#;
        let record = ProjectRecord::from_json(json).unwrap();
        let entry = &record.nodes["sharpness_0"];
        assert_eq!(entry.position, Position::new(10.0, 20.0));
        assert_eq!(
            entry.settings.for_alias("sharpness_0").get_i64("sharpness_percentage_0"),
            Some(40)
        );
    }

    #[test]
    fn test_capture_of_fresh_graph() {
        let graph = GraphStore::new();
        let record = ProjectRecord::capture(&graph);
        assert_eq!(record.nodes.len(), 2);
        assert!(record.nodes.contains_key(INPUT_ALIAS));
        assert!(record.nodes.contains_key(OUTPUT_ALIAS));
        assert!(record.links.is_empty());
        assert!(record.image.is_none());
    }
}

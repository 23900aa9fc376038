//! Node instances of the editor graph.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::arena::{NodeId, PortId};
use super::property::Settings;
use crate::plugin::ModuleKind;

/// Canvas coordinate of a node. Display-only.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<[f32; 2]> for Position {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [f32; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

/// Kind-specific state carried by a node.
#[derive(Clone, Debug, Default)]
pub enum NodeData {
    /// Source image and the path it was loaded from.
    Input {
        image: Option<RgbaImage>,
        image_path: Option<PathBuf>,
    },
    /// Last rendered result (full resolution) and its on-screen preview.
    Output {
        image: Option<RgbaImage>,
        preview: Option<RgbaImage>,
    },
    #[default]
    Transform,
}

impl NodeData {
    pub fn for_kind(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Input => NodeData::Input {
                image: None,
                image_path: None,
            },
            ModuleKind::Output => NodeData::Output {
                image: None,
                preview: None,
            },
            _ => NodeData::Transform,
        }
    }
}

/// A live node owned by the graph store.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: ModuleKind,
    /// Stable name, `resize_0`, or `Input`/`Output` for the singletons.
    pub alias: String,
    pub settings: Settings,
    pub position: Position,
    pub input_port: Option<PortId>,
    pub output_port: Option<PortId>,
    pub data: NodeData,
}

impl Node {
    pub fn is_protected(&self) -> bool {
        self.kind.is_protected()
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            kind: self.kind,
            alias: self.alias.clone(),
            settings: self.settings.clone(),
            position: self.position,
        }
    }
}

/// Everything needed to re-create a node with its identity.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
    pub kind: ModuleKind,
    pub alias: String,
    pub settings: Settings,
    pub position: Position,
}

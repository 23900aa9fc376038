//! Core of a node-based image editor.
//!
//! A [`GraphStore`] holds the nodes and links of a session. The chain reachable from the
//! Input node ([`ActivePath`]) is rendered by [`rendering::render`], and an
//! [`EditorSession`] ties edits, undo/redo, project files and a [`Frontend`] together.

pub mod config;
pub mod editor;
pub mod error;
pub mod io;
pub mod loader;
pub mod model;
pub mod plugin;
pub mod rendering;

pub use config::EditorConfig;
pub use editor::{EditorSession, Frontend, HeadlessFrontend, HistoryItem, HistoryManager};
pub use error::LibraryError;
pub use model::project::{
    ActivePath, GraphStore, LinkEnds, LinkId, NodeId, PortId, Position, ProjectRecord,
    SettingValue, Settings, resolve_path,
};
pub use plugin::ModuleKind;

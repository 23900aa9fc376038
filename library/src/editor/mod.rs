//! Editing sessions - public API for frontends.
//!
//! A frontend drives a [`EditorSession`] and receives previews and notices back through
//! the [`Frontend`] trait.

mod editor_graph_ops;
mod editor_project_ops;
pub mod editor_service;
pub mod frontend;
pub mod history;

// Re-exports for convenient access
pub use editor_service::EditorSession;
pub use frontend::{Frontend, HeadlessFrontend, Notice};
pub use history::{HistoryAction, HistoryItem, HistoryManager};

use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::frontend::Frontend;
use super::history::{HistoryItem, HistoryManager};
use crate::config::EditorConfig;
use crate::error::LibraryError;
use crate::model::project::arena::NodeId;
use crate::model::project::graph::GraphStore;
use crate::model::project::graph_analysis::{ActivePath, resolve_path};
use crate::model::project::property::SettingValue;
use crate::rendering::render;

/// One editing session: the graph, its history and the frontend showing it.
///
/// Every edit goes through here so that it is recorded and the preview stays current.
pub struct EditorSession<F: Frontend> {
    pub(super) graph: GraphStore,
    pub(super) history: HistoryManager,
    pub(super) path: ActivePath,
    pub(super) config: EditorConfig,
    pub(super) project_path: Option<PathBuf>,
    pub(super) frontend: F,
}

impl<F: Frontend> EditorSession<F> {
    pub fn new(config: EditorConfig, frontend: F) -> Self {
        let graph = GraphStore::new();
        let path = resolve_path(&graph);
        Self {
            graph,
            history: HistoryManager::new(),
            path,
            config,
            project_path: None,
            frontend,
        }
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn active_path(&self) -> &ActivePath {
        &self.path
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    /// Re-resolves the active path, renders it and presents the preview.
    pub fn refresh(&mut self) -> Result<(), LibraryError> {
        self.path = resolve_path(&self.graph);
        let max = self.config.preview_max_dimension;
        let rendered = render(&mut self.graph, &self.path, max).map(|_| ());
        match rendered {
            Ok(()) => {
                self.frontend.present(self.graph.output_preview());
                Ok(())
            }
            Err(e) => {
                self.frontend.present(None);
                Err(self.fail("Render failed", e))
            }
        }
    }

    /// Refresh after an edit. The edit itself stands even if rendering fails.
    pub(super) fn rerender(&mut self) {
        if let Err(e) = self.refresh() {
            warn!("Preview not updated: {}", e);
        }
    }

    /// Sets a node setting, records it and re-renders.
    pub fn set_setting(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<SettingValue>,
    ) -> Result<(), LibraryError> {
        self.set_setting_with_history(node, key, value.into(), true)
    }

    /// Like [`set_setting`](Self::set_setting); `record: false` leaves history untouched.
    pub fn set_setting_with_history(
        &mut self,
        node: NodeId,
        key: &str,
        value: SettingValue,
        record: bool,
    ) -> Result<(), LibraryError> {
        let old = match self.graph.set_setting(node, key, value) {
            Ok(old) => old,
            Err(e) => return Err(self.fail("Invalid setting", e)),
        };
        let stored = self.graph.node(node).and_then(|n| n.settings.get(key).copied());
        if record && stored != Some(old) {
            let (Some(alias), Some(new)) = (self.graph.alias_of(node), stored) else {
                return Err(LibraryError::node_not_found(node.to_string()));
            };
            self.history
                .append(HistoryItem::settings_update(alias, key, old, new));
        }
        self.rerender();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, LibraryError> {
        let result = self.history.undo(&mut self.graph);
        self.rerender();
        result.map_err(|e| self.fail("Undo failed", e))
    }

    pub fn redo(&mut self) -> Result<bool, LibraryError> {
        let result = self.history.redo(&mut self.graph);
        self.rerender();
        result.map_err(|e| self.fail("Redo failed", e))
    }

    /// Tells the frontend about a failure and hands the error back.
    pub(super) fn fail(&mut self, title: &str, error: LibraryError) -> LibraryError {
        debug!("{}: {:?}", title, error);
        self.frontend.notify(title, &user_message(&error));
        error
    }
}

/// Short text shown to the user for an error.
pub fn user_message(error: &LibraryError) -> String {
    match error {
        LibraryError::InvalidLocation(_) => "Invalid location specified.".to_string(),
        LibraryError::ProjectNotFound(_) => "Project file not found.".to_string(),
        LibraryError::SourceImageMissing(_) => "Image file could not be found.".to_string(),
        LibraryError::NothingToExport => "There is no output image to export.".to_string(),
        other => other.to_string(),
    }
}

/// Appends `.{extension}` unless the path already ends with it.
pub fn ensure_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == extension) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_extension() {
        assert_eq!(
            ensure_extension(Path::new("a/b.cresliant"), "cresliant"),
            PathBuf::from("a/b.cresliant")
        );
        assert_eq!(
            ensure_extension(Path::new("a/b"), "cresliant"),
            PathBuf::from("a/b.cresliant")
        );
        assert_eq!(
            ensure_extension(Path::new("b.json"), "cresliant"),
            PathBuf::from("b.json.cresliant")
        );
    }

    #[test]
    fn test_user_message_for_location() {
        let e = LibraryError::InvalidLocation(PathBuf::from("/nowhere"));
        assert_eq!(user_message(&e), "Invalid location specified.");
    }
}

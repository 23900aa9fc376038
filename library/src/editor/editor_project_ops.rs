use log::info;
use std::path::{Path, PathBuf};

use super::editor_service::{EditorSession, ensure_extension};
use super::frontend::Frontend;
use crate::error::LibraryError;
use crate::io::exporters::{export_image, with_default_extension};
use crate::loader::image::load_image;
use crate::model::project::project::{ProjectRecord, RestoreReport};

/// Project and file operations.
impl<F: Frontend> EditorSession<F> {
    /// Drops every transform node and all history. The source image is kept.
    pub fn new_project(&mut self) {
        self.graph.reset();
        self.history.clear();
        self.project_path = None;
        info!("Started a new project");
        self.rerender();
    }

    pub fn open_project(&mut self, path: &Path) -> Result<RestoreReport, LibraryError> {
        let record = match ProjectRecord::read_from(path) {
            Ok(record) => record,
            Err(e) => return Err(self.fail("Error", e)),
        };

        let report = record.restore(&mut self.graph, path.parent());
        self.history.clear();
        self.project_path = Some(path.to_path_buf());
        info!("Opened project {}", path.display());

        if report.source_image_missing() {
            self.frontend
                .notify("Warning", "Image file could not be found.");
        }
        self.frontend
            .notify("Success", "Project opened successfully.");
        self.rerender();
        Ok(report)
    }

    /// Saves to `path`, or to the project's current file when `None`.
    /// Returns the path written, which always carries the project extension.
    pub fn save_project(&mut self, path: Option<&Path>) -> Result<PathBuf, LibraryError> {
        let target = path
            .or(self.project_path.as_deref())
            .map(|path| ensure_extension(path, &self.config.project_extension));
        let Some(target) = target else {
            let e = LibraryError::InvalidLocation(PathBuf::new());
            return Err(self.fail("Error", e));
        };

        let record = ProjectRecord::capture(&self.graph);
        if let Err(e) = record.write_to(&target) {
            return Err(self.fail("Error", e));
        }
        info!("Saved project to {}", target.display());
        self.project_path = Some(target.clone());
        self.frontend.notify("Success", "Project saved successfully.");
        Ok(target)
    }

    /// Writes the full-resolution output. A path without extension gets the default one.
    pub fn export_output(&mut self, path: &Path) -> Result<PathBuf, LibraryError> {
        let target = with_default_extension(path, &self.config.default_export_extension);
        let result = match self.graph.output_image() {
            Some(image) => export_image(&target, image),
            None => Err(LibraryError::NothingToExport),
        };
        if let Err(e) = result {
            return Err(self.fail("Error", e));
        }
        self.frontend.notify("Success", "Image exported successfully.");
        Ok(target)
    }

    /// Loads the image the Input node feeds into the graph.
    pub fn load_source_image(&mut self, path: &Path) -> Result<(), LibraryError> {
        let image = match load_image(path) {
            Ok(image) => image,
            Err(e) => return Err(self.fail("Error", e)),
        };
        info!(
            "Loaded source image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.graph.set_source_image(image, Some(path.to_path_buf()));
        self.rerender();
        Ok(())
    }
}

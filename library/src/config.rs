use directories::ProjectDirs;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LibraryError;
use crate::model::project::graph_node::Position;

const CONFIG_FILE: &str = "editor.toml";
const ROW_HEIGHT: f32 = 200.0;

/// Editor preferences. Missing fields take their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Longer side of the on-screen preview, in pixels
    pub preview_max_dimension: u32,
    /// Extension given to saved projects
    pub project_extension: String,
    /// Extension used when an export path has none
    pub default_export_extension: String,
    pub node_spacing: [f32; 2],
    pub grid_origin: [f32; 2],
    pub grid_columns: u32,
    pub duplicate_offset: [f32; 2],
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preview_max_dimension: 450,
            project_extension: "cresliant".to_string(),
            default_export_extension: "png".to_string(),
            node_spacing: [220.0, 0.0],
            grid_origin: [300.0, 100.0],
            grid_columns: 4,
            duplicate_offset: [30.0, 30.0],
        }
    }
}

impl EditorConfig {
    /// Canvas position of the `index`-th automatically placed node.
    ///
    /// Nodes fill a row of `grid_columns` slots, then wrap onto the next row
    /// shifted down by the node height.
    pub fn grid_position(&self, index: usize) -> Position {
        let columns = self.grid_columns.max(1) as usize;
        let (row, column) = (index / columns, index % columns);
        let [sx, sy] = self.node_spacing;
        let [ox, oy] = self.grid_origin;
        Position::new(
            ox + sx * column as f32,
            oy + sy * column as f32 + ROW_HEIGHT * row as f32,
        )
    }

    pub fn duplicate_position(&self, original: Position) -> Position {
        let [dx, dy] = self.duplicate_offset;
        original.offset(dx, dy)
    }
}

/// Location of `editor.toml` in the platform config directory, created on demand.
pub fn config_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("io", "cresliant", "cresliant")?;
    let config_dir = proj_dirs.config_dir();
    if !config_dir.exists() {
        if let Err(e) = fs::create_dir_all(config_dir) {
            error!("Failed to create config directory: {}", e);
            return None;
        }
    }
    Some(config_dir.join(CONFIG_FILE))
}

/// Reads a config file, failing on any read or parse error.
pub fn read_config(path: &Path) -> Result<EditorConfig, LibraryError> {
    let toml_str = fs::read_to_string(path)?;
    Ok(toml::from_str(&toml_str)?)
}

/// Reads a config file, using defaults when it is missing or broken.
pub fn load_config_from(path: &Path) -> EditorConfig {
    if !path.exists() {
        return EditorConfig::default();
    }
    match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config {}, using defaults: {}", path.display(), e);
            EditorConfig::default()
        }
    }
}

pub fn save_config_to(path: &Path, config: &EditorConfig) -> Result<(), LibraryError> {
    let toml_str = toml::to_string_pretty(config)?;
    fs::write(path, toml_str)?;
    info!("Config saved to {}", path.display());
    Ok(())
}

pub fn load_config() -> EditorConfig {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => EditorConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}", uuid::Uuid::new_v4(), name))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config_from(&temp_file("absent.toml"));
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_broken_file_falls_back() {
        let path = temp_file("broken.toml");
        fs::write(&path, "preview_max_dimension = \"large\"").unwrap();
        assert_eq!(load_config_from(&path), EditorConfig::default());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_file("partial.toml");
        fs::write(&path, "preview_max_dimension = 200\n").unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.preview_max_dimension, 200);
        assert_eq!(config.project_extension, "cresliant");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_file("saved.toml");
        let config = EditorConfig {
            grid_columns: 2,
            ..EditorConfig::default()
        };
        save_config_to(&path, &config).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_grid_wraps_after_columns() {
        let config = EditorConfig::default();
        assert_eq!(config.grid_position(0), Position::new(300.0, 100.0));
        assert_eq!(config.grid_position(1), Position::new(520.0, 100.0));
        assert_eq!(config.grid_position(4), Position::new(300.0, 300.0));
    }
}

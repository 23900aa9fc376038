use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid location specified: {}", .0.display())]
    InvalidLocation(PathBuf),
    #[error("Project file not found: {}", .0.display())]
    ProjectNotFound(PathBuf),
    #[error("Source image not found: {}", .0.display())]
    SourceImageMissing(PathBuf),
    #[error("Unknown module kind: {0}")]
    UnknownModuleKind(String),
    #[error("Node {0} is protected")]
    ProtectedNode(String),
    #[error("Node {0} not found")]
    NodeNotFound(String),
    #[error("Port not found")]
    PortNotFound,
    #[error("Link not found")]
    LinkNotFound,
    #[error("Invalid link: {0}")]
    InvalidLink(String),
    #[error("Module {kind} has no setting '{key}'")]
    UnknownSetting { kind: String, key: String },
    #[error("Module {kind} cannot take {value} for '{key}'")]
    InvalidSettingValue {
        kind: String,
        key: String,
        value: String,
    },
    #[error("Image of {width}x{height} exceeds the size limit")]
    ImageTooLarge { width: u64, height: u64 },
    #[error("Module {0} does not transform images")]
    NotATransform(String),
    #[error("Nothing to export: the output is empty")]
    NothingToExport,
    #[error("History error: {0}")]
    History(String),
}

impl LibraryError {
    pub fn node_not_found(alias: impl Into<String>) -> Self {
        LibraryError::NodeNotFound(alias.into())
    }

    pub fn invalid_link(msg: impl Into<String>) -> Self {
        LibraryError::InvalidLink(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        LibraryError::History(msg.into())
    }
}

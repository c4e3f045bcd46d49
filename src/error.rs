//! Error type shared by the store, the board and the CLI handlers.

use std::path::PathBuf;

use crate::fields::ColumnKey;

/// Everything that can go wrong while loading, mutating or persisting boards.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode project list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not parse config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("task '{0}' not found")]
    TaskNotFound(String),
    #[error("'{name}' matches several {kind}; use the id instead")]
    Ambiguous { name: String, kind: &'static str },
    #[error("no task at {column} index {index}")]
    InvalidPosition { column: ColumnKey, index: usize },
    #[error("could not read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("attachment is not a base64 data URI")]
    MalformedDataUri,
    #[error("stored project list '{0}' could not be read or moved aside; refusing to overwrite it")]
    StateLocked(String),
    #[error("could not determine a home directory; pass --data-dir")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, BoardError>;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unable to find file or directory named {path}")]
    NotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt record at position {index}: {source}")]
    CorruptEntry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl FolioError {
    /// True for errors reporting a missing collection or resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FolioError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;

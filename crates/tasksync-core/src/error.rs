use crate::jsonc::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("outline not found: {}", .0.display())]
    OutlineNotFound(PathBuf),

    #[error("task document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("duplicate task IDs: {}", .0.join(", "))]
    DuplicateIds(Vec<String>),

    #[error("invalid task document {}: {reason}", path.display())]
    InvalidDocument { path: PathBuf, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("invalid status '{0}': expected pending, in_progress, or completed")]
    InvalidStatus(String),

    #[error("cannot append a section: section numbers exhausted")]
    SectionNumberOverflow,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

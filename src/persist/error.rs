//! Errors raised while saving and loading games.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by save documents and the save store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("incompatible save file version {found:?} (expected {expected:?})")]
    VersionMismatch { found: String, expected: String },

    #[error("corrupted save file: {0}")]
    Corrupt(String),

    #[error("save file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("save file must be within the save directory: {}", .0.display())]
    PathEscape(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Corrupt(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirmaError {
    /// Unreadable or malformed roster. Aborts the whole run.
    #[error("Failed to read roster {path}: {reason}")]
    RosterRead { path: PathBuf, reason: String },

    #[error("Failed to load signature image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    #[error("Page {page} text could not be read: {reason}")]
    PageText { page: u32, reason: String },

    #[error("Failed to place signature: {0}")]
    Placement(String),

    #[error("Failed to open PDF {path}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("Failed to save PDF {path}: {reason}")]
    DocumentSave { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FirmaError>;

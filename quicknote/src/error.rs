//! Error types for QuickNote
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized for UI surfaces.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// The durable backend rejected or failed a write.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The backend could not be opened at all. Fatal at startup.
    #[error("Unresolvable storage error: {0}")]
    Unresolvable(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// True for failures raised by the durable backend rather than by the caller.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Persistence(_))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

//! Error types for toolshed
//!
//! Centralized error handling using thiserror. Callers translate these into
//! user-facing responses; nothing here knows about presentation.

use thiserror::Error;

/// All error types that can occur in toolshed
#[derive(Debug, Error)]
pub enum AdminError {
    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Foreign key, CHECK or protected-root violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Cycle-forming move or self-parenting
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A freshly written row could not be read back
    #[error("Creation failed: {0}")]
    CreationFailed(String),

    /// Malformed caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Any other SQLite failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML seed definition error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AdminError {
    /// Build a NotFound for a kind of record and its id.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} {}", kind, id))
    }
}

impl From<rusqlite::Error> for AdminError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => Self::ConstraintViolation(err.to_string()),
            _ => Self::Storage(err.to_string()),
        }
    }
}

/// Result type alias for toolshed operations
pub type Result<T> = std::result::Result<T, AdminError>;

//! Error types for wol_hosts

use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    /// Number of form fields that failed validation.
    #[error("{0} field(s) failed validation")]
    Validation(usize),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn not_found(kind: &str, id: &str) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    /// Maps a non-success HTTP status to the error taxonomy.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            403 => Error::PermissionDenied(context.to_string()),
            404 => Error::not_found("endpoint", context),
            409 => Error::Conflict(context.to_string()),
            code => Error::Transport(format!("{} returned HTTP {}", context, code)),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

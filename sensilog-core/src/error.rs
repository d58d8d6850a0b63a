//! Error types for sensilog-core

use thiserror::Error;

/// Main error type for the sensilog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected at the ingestion boundary
    #[error("invalid input: {0}")]
    Validation(String),

    /// Record not found for the requesting user
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Identity provider (OAuth) error
    #[error("identity provider error: {0}")]
    Identity(String),

    /// User has no linked third-party account
    #[error("no linked account for user: {0}")]
    AccountNotLinked(String),

    /// Third-party account already belongs to another local user
    #[error("account {riot_id} is already linked to user {user_id}")]
    AccountConflict { riot_id: String, user_id: String },
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result type alias for sensilog-core
pub type Result<T> = std::result::Result<T, Error>;

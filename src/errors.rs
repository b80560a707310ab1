use thiserror::Error;

use crate::types::Value;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Could not {action} record with id: {id} because it does not exist")]
    NotFound { action: &'static str, id: Value },

    #[error("Unsupported filter combination: {0}")]
    UnsupportedFilterCombination(String),

    #[error("SQLite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl RepoError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) const fn not_found(action: &'static str, id: Value) -> Self {
        Self::NotFound { action, id }
    }

    /// Identity carried by a `NotFound` error.
    #[must_use]
    pub const fn missing_id(&self) -> Option<&Value> {
        match self {
            Self::NotFound { id, .. } => Some(id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ProspectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown lead source: {0}")]
    UnknownSource(String),

    #[error("Lead {id} not found")]
    LeadNotFound { id: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ProspectorError {
    /// True when the failure is a missing lead reference rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProspectorError::LeadNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProspectorError>;

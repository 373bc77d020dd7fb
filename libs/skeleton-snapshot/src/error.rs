//! # Snapshot Errors
//!
//! Error types for snapshot parsing and decoding.

use thiserror::Error;

/// Result alias used throughout the snapshot crate.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Errors that can occur while reading or decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The JSON form could not be parsed or written
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value could not be parsed into the expected type
    #[error("Invalid value for {entity} {id}: {key} = {value:?}")]
    InvalidValue {
        entity: &'static str,
        id: String,
        key: String,
        value: String,
    },

    /// A required key is absent
    #[error("Missing {key} on {entity} {id}")]
    MissingKey {
        entity: &'static str,
        id: String,
        key: String,
    },

    /// An id refers to an entity that does not exist
    #[error("{entity} {id} references unknown {target} {target_id}")]
    DanglingReference {
        entity: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },

    /// The component graph is not a tree
    #[error("Invalid component tree: {message}")]
    Topology { message: String },
}

impl SnapshotError {
    /// Creates an invalid value error.
    pub fn invalid_value(
        entity: &'static str,
        id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            entity,
            id: id.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a missing key error.
    pub fn missing_key(entity: &'static str, id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingKey {
            entity,
            id: id.into(),
            key: key.into(),
        }
    }

    /// Creates a dangling reference error.
    pub fn dangling(
        entity: &'static str,
        id: impl Into<String>,
        target: &'static str,
        target_id: impl Into<String>,
    ) -> Self {
        Self::DanglingReference {
            entity,
            id: id.into(),
            target,
            target_id: target_id.into(),
        }
    }

    /// Creates a component topology error.
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology {
            message: message.into(),
        }
    }
}

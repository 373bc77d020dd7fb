//! # Mesh Errors
//!
//! Error types for mesh generation operations. None of these cross the
//! worker boundary: the generator absorbs them into error counters and
//! messages on the [`Outcome`](crate::Outcome).

use skeleton_snapshot::SnapshotError;
use thiserror::Error;

/// Result alias for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh generation.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The snapshot could not be decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Invalid mesh or skeleton topology
    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    /// Degenerate geometry
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry { message: String },

    /// Boolean operation failed
    #[error("Boolean operation failed: {message}")]
    BooleanFailed { message: String },

    /// Input to a boolean operation intersects itself
    #[error("Self-intersecting mesh: {message}")]
    SelfIntersecting { message: String },

    /// Mesh does not satisfy an operation's precondition
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

impl MeshError {
    /// Creates an invalid topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }

    /// Creates a boolean operation failed error.
    pub fn boolean_failed(message: impl Into<String>) -> Self {
        Self::BooleanFailed {
            message: message.into(),
        }
    }

    /// Creates a self-intersection error.
    pub fn self_intersecting(message: impl Into<String>) -> Self {
        Self::SelfIntersecting {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

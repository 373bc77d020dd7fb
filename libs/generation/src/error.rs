//! # Generation Errors
//!
//! Errors raised around the stage workers. None of them reach a stage's
//! consumer directly: the coordinator turns them into the stage's failed
//! output.

use thiserror::Error;

/// Result alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors that can occur while running the stage pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A stage worker panicked before producing its output
    #[error("{stage} worker panicked: {message}")]
    WorkerPanicked { stage: &'static str, message: String },

    /// A stage worker went away without reporting back
    #[error("{stage} worker disconnected before finishing")]
    WorkerDisconnected { stage: &'static str },

    /// A stage worker thread could not be started
    #[error("{stage} worker could not be spawned: {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not a valid texture image
    #[error("Invalid texture image: {message}")]
    InvalidImage { message: String },

    /// Mesh generation error
    #[error(transparent)]
    Mesh(#[from] skeleton_mesh::MeshError),

    /// Snapshot decoding error
    #[error(transparent)]
    Snapshot(#[from] skeleton_snapshot::SnapshotError),
}

impl GenerationError {
    /// Creates a worker panic error from a panic payload.
    pub fn panicked(stage: &'static str, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::WorkerPanicked { stage, message }
    }

    /// Creates an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }
}

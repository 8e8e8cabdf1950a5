//! Error types for readerpulse

use thiserror::Error;

/// Errors that can occur at the storage and boundary seams.
///
/// None of these cross the engine's public surface: stores absorb them, log,
/// and degrade to an empty or in-memory state for the rest of the session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Storage(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Translation boundary error: {0}")]
    Translation(String),
}

//! Error types for the FleetSim environment abstraction.

use thiserror::Error;

/// Errors that can occur at the seams between the engine and its
/// external collaborators.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Storage backend read/write failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Route acquisition failed (unknown label, degenerate geometry, etc.)
    #[error("Route acquisition error: {0}")]
    RouteError(String),

    /// Record serialization/deserialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Context operation failed
    #[error("Context error: {0}")]
    ContextError(String),
}

impl EnvError {
    /// Creates a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Creates a route acquisition error.
    pub fn route(msg: impl Into<String>) -> Self {
        Self::RouteError(msg.into())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}

//! Error types for the relational store.

use crate::types::{EntityKind, RecordId};
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation's primary subject does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: RecordId },

    /// A required foreign identity (owner, member type) does not resolve.
    #[error("Invalid reference to {kind}: {id:?}")]
    InvalidReference { kind: EntityKind, id: RecordId },

    /// A uniqueness constraint would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An edge mutation contradicts the current follower graph.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),
}

impl StoreError {
    pub(crate) fn not_found(kind: EntityKind, id: &RecordId) -> Self {
        StoreError::NotFound {
            kind,
            id: id.clone(),
        }
    }

    pub(crate) fn invalid_reference(kind: EntityKind, id: &RecordId) -> Self {
        StoreError::InvalidReference {
            kind,
            id: id.clone(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Deserialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

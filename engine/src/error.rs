//! Error types for the RentX engine.

use crate::{LocalId, SchemaVersion, Version};
use thiserror::Error;

/// All possible errors from the RentX engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Session slot errors
    #[error("a user record already exists: {0}")]
    UserAlreadyExists(LocalId),

    #[error("user not found: {0}")]
    UserNotFound(LocalId),

    // Validation errors
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid rental period: {0}")]
    InvalidPeriod(String),

    // Sync state errors
    #[error("cursor regression: current version {current}, received {received}")]
    CursorRegression { current: Version, received: Version },

    #[error("schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch {
        expected: SchemaVersion,
        actual: SchemaVersion,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates record errors, persistent-identifier
//! errors, index errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::{PidStatus, RecordId};

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur during persistence
/// operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record state errors
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Persistent-identifier errors
    #[error(transparent)]
    Pid(#[from] PidError),

    /// Search index errors
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The requested record was not found.
    #[error("record not found: {id}")]
    NotFound { id: RecordId },

    /// A record with the given identifier already exists.
    #[error("record already exists: {id}")]
    AlreadyExists { id: RecordId },

    /// The record has been deleted.
    #[error("record deleted: {id}")]
    Gone {
        id: RecordId,
        deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    },

    /// Revision conflict detected during optimistic locking.
    #[error("revision conflict on {id}: expected {expected}, found {actual}")]
    RevisionConflict {
        id: RecordId,
        expected: u64,
        actual: u64,
    },
}

/// Errors related to persistent identifiers.
#[derive(Error, Debug)]
pub enum PidError {
    /// No identifier entry exists for the given scheme and value.
    #[error("persistent identifier not found: {scheme}:{pid_value}")]
    NotFound { scheme: String, pid_value: String },

    /// An identifier with the same scheme and value already exists.
    ///
    /// Minting never overwrites silently; this is the conflict the caller
    /// must resolve.
    #[error("persistent identifier already exists: {scheme}:{pid_value}")]
    AlreadyExists { scheme: String, pid_value: String },

    /// The requested status transition is not allowed.
    #[error("invalid status transition for {scheme}:{pid_value}: {from} -> {to}")]
    InvalidTransition {
        scheme: String,
        pid_value: String,
        from: PidStatus,
        to: PidStatus,
    },

    /// The identifier references a record that does not exist.
    #[error("persistent identifier {scheme}:{pid_value} references missing record {object_id}")]
    MissingObject {
        scheme: String,
        pid_value: String,
        object_id: RecordId,
    },
}

/// Errors related to the search index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// No index document exists for the record in the named index.
    #[error("no document for record {record_id} in index '{index}'")]
    DocumentNotFound { index: String, record_id: RecordId },

    /// The requested sort field is not one of the configured sort options.
    #[error("unknown sort field: {field}")]
    UnknownSortField { field: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Connection pool exhausted.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal backend error.
    #[error("internal backend error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::Serialization {
            message: err.to_string(),
        })
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted)
    }
}

impl StorageError {
    /// Returns `true` if the error is a uniqueness/revision conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::Record(RecordError::AlreadyExists { .. })
                | StorageError::Record(RecordError::RevisionConflict { .. })
                | StorageError::Pid(PidError::AlreadyExists { .. })
        )
    }
}

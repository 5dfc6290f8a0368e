//! Error types for the Docket REST API.
//!
//! This module defines all error types used throughout the REST layer, with
//! automatic conversion from persistence errors and rendering as JSON
//! problem bodies.
//!
//! # Error Mapping
//!
//! Storage errors from the persistence layer are automatically mapped to
//! appropriate HTTP status codes:
//!
//! | Storage Error | HTTP Status |
//! |--------------|-------------|
//! | Record/Pid NotFound | 404 |
//! | Record Gone / Pid Deleted | 410 |
//! | RevisionConflict | 409 |
//! | AlreadyExists (record or pid) | 409 |
//! | InvalidTransition | 409 |
//! | MissingObject / UnknownSortField | 400 |
//! | BackendError | 500 |

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docket_persistence::error::{
    BackendError, IndexError, PidError, RecordError, StorageError,
};
use serde_json::json;

use crate::config::Verb;

/// The primary error type for REST API operations.
#[derive(Debug)]
pub enum ApiError {
    /// No record is known under the given identifier (HTTP 404).
    NotFound {
        /// The external identifier or record id that failed to resolve.
        pid: String,
    },

    /// The identifier or its record was deleted (HTTP 410 Gone).
    Gone {
        /// The external identifier.
        pid: String,
    },

    /// Revision conflict during update (HTTP 409).
    RevisionConflict {
        /// Message describing the conflict.
        message: String,
    },

    /// Uniqueness conflict, e.g. an identifier already minted (HTTP 409).
    Conflict {
        /// Message describing the conflict.
        message: String,
    },

    /// Bad request - validation error (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// The permission policy rejects the verb (HTTP 403).
    Forbidden {
        /// The rejected verb.
        verb: Verb,
    },

    /// Internal server error (HTTP 500).
    Internal {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound { pid } => {
                write!(f, "record not found: {pid}")
            }
            ApiError::Gone { pid } => {
                write!(f, "record deleted: {pid}")
            }
            ApiError::RevisionConflict { message } => {
                write!(f, "revision conflict: {message}")
            }
            ApiError::Conflict { message } => {
                write!(f, "conflict: {message}")
            }
            ApiError::BadRequest { message } => {
                write!(f, "bad request: {message}")
            }
            ApiError::Forbidden { verb } => {
                write!(f, "permission denied for {}", verb.as_str())
            }
            ApiError::Internal { message } => {
                write!(f, "internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Gone { .. } => StatusCode::GONE,
            ApiError::RevisionConflict { .. } | ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Record(RecordError::NotFound { id }) => ApiError::NotFound {
                pid: id.to_string(),
            },
            StorageError::Record(RecordError::Gone { id, .. }) => ApiError::Gone {
                pid: id.to_string(),
            },
            StorageError::Record(RecordError::AlreadyExists { id }) => ApiError::Conflict {
                message: format!("record already exists: {id}"),
            },
            StorageError::Record(RecordError::RevisionConflict {
                id,
                expected,
                actual,
            }) => ApiError::RevisionConflict {
                message: format!("record {id}: expected revision {expected}, found {actual}"),
            },
            StorageError::Pid(PidError::NotFound { scheme, pid_value }) => ApiError::NotFound {
                pid: format!("{scheme}:{pid_value}"),
            },
            StorageError::Pid(PidError::AlreadyExists { scheme, pid_value }) => {
                ApiError::Conflict {
                    message: format!("persistent identifier already exists: {scheme}:{pid_value}"),
                }
            }
            StorageError::Pid(err @ PidError::InvalidTransition { .. }) => ApiError::Conflict {
                message: err.to_string(),
            },
            StorageError::Pid(err @ PidError::MissingObject { .. }) => ApiError::BadRequest {
                message: err.to_string(),
            },
            StorageError::Index(err @ IndexError::UnknownSortField { .. }) => {
                ApiError::BadRequest {
                    message: err.to_string(),
                }
            }
            StorageError::Index(err @ IndexError::DocumentNotFound { .. }) => ApiError::NotFound {
                pid: err.to_string(),
            },
            StorageError::Backend(err) => {
                tracing::error!(error = %err, "backend failure");
                ApiError::Internal {
                    message: backend_message(&err),
                }
            }
        }
    }
}

/// Keeps backend internals out of response bodies.
fn backend_message(err: &BackendError) -> String {
    match err {
        BackendError::PoolExhausted => "storage temporarily unavailable".to_string(),
        BackendError::ConnectionFailed { .. } => "storage unreachable".to_string(),
        _ => "storage failure".to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "status": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for REST handlers.
pub type ApiResult<T> = Result<T, ApiError>;

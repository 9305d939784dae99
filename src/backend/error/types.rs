/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the draft subsystem.
 *
 * # Error Types
 *
 * - `StoreError` - failures of the durable draft store
 * - `BackendError` - errors surfaced by HTTP handlers
 *
 * # Propagation Policy
 *
 * Operation-level failures never terminate a WebSocket connection; the
 * session handler maps them to `ack`/`committed` replies with a
 * negative result and the client recovers with a full commit. Only
 * authentication and identification failures close a connection, and
 * those are reported via close codes, not via these types.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the durable draft store
#[derive(Debug, Error)]
pub enum StoreError {
    /// No draft exists for the user (or it had expired and was purged)
    #[error("draft not found")]
    NotFound,

    /// The underlying database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored snapshot could not be decoded or encoded
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request-level error with an explicit status code
    #[error("handler error: {message}")]
    Handler {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Draft store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Serialization failure outside the store
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Handler` - the status carried by the error
    /// - `Store(NotFound)` - 404 Not Found
    /// - `Store(_)` / `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Handler { status, .. } => *status,
            Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message for the response body
    pub fn message(&self) -> String {
        self.to_string()
    }
}

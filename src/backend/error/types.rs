/**
 * Backend Error Types
 *
 * This module defines the error type returned by HTTP handlers.
 *
 * # Error Categories
 *
 * - `Authentication` - no authenticated current user for an operation that
 *   requires one; the operation aborts with no partial state change
 * - `Validation` - self-addressed message, empty text, unknown receiver;
 *   aborted before persistence
 * - `Database` - persistence-path failure; hard error, since a send must
 *   not appear to succeed without a committed row
 *
 * Relay publish failures are deliberately absent here: the relay is
 * best-effort and never propagates an error to the caller.
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Errors surfaced by the messaging HTTP surface
#[derive(Debug, Error)]
pub enum ApiError {
    /// No authenticated current user
    #[error("Authentication required: {message}")]
    Authentication {
        /// Human-readable error message
        message: String,
    },

    /// Request failed validation before any state change
    #[error(transparent)]
    Validation(#[from] SharedError),

    /// Persistence-path database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Create a new authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(SharedError::validation(field, message))
    }

    /// HTTP status code mapping
    ///
    /// - `Authentication` - 401 Unauthorized
    /// - `Validation` - 400 Bad Request
    /// - `Database` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message for the response body
    pub fn message(&self) -> String {
        self.to_string()
    }
}

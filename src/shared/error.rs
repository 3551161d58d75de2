//! Shared Error Types
//!
//! Failure cases that are meaningful on both sides of the wire. The server
//! maps these onto HTTP statuses; the client surfaces them directly.
use thiserror::Error;

/// Errors that can occur in both server and client contexts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error (empty text, self-addressed message, ...)
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = SharedError::validation("message", "cannot be empty");
        match error {
            SharedError::ValidationError { field, message } => {
                assert_eq!(field, "message");
                assert_eq!(message, "cannot be empty");
            }
            _ => panic!("Expected ValidationError"),
        }
    }

    #[test]
    fn test_error_display() {
        let error = SharedError::validation("receiver_id", "cannot message yourself");
        let display = format!("{}", error);
        assert!(display.contains("receiver_id"));
        assert!(display.contains("cannot message yourself"));
    }

    #[test]
    fn test_from_serde_error() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ not json }");
        let shared: SharedError = result.unwrap_err().into();
        match shared {
            SharedError::SerializationError { .. } => {}
            _ => panic!("Expected SerializationError from serde error"),
        }
    }
}

//! Error types for the registry clients

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a registry
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource being created already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// The requested change conflicts with the current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Registry error code, when the body carried one
        code: Option<String>,
        /// Error message from the API
        message: String,
    },

    /// An image import finished in a failed state
    #[error("Import of image {uuid} failed: {message}")]
    ImportFailed {
        uuid: uuid::Uuid,
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error body returned by the registries
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Classify an error response by status code and registry error code
    pub fn from_response(status: u16, body: &str) -> Self {
        let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (
                parsed.code,
                parsed.message.unwrap_or_else(|| body.to_string()),
            ),
            Err(_) => (None, body.to_string()),
        };

        match (status, code.as_deref()) {
            (_, Some("ImageUuidAlreadyExists" | "EntryAlreadyExists")) => {
                Self::AlreadyExists(message)
            }
            (_, Some("AttributeOrValueExists" | "UserExists")) => Self::Conflict(message),
            (404, _) | (_, Some("ResourceNotFound" | "NoSuchObject")) => Self::NotFound(message),
            (409, _) => Self::Conflict(message),
            _ => Self::ApiError {
                status,
                code,
                message,
            },
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error reports that the target already exists
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Check if this error is a conflict with the current state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

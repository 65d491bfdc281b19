//! Error types for the bootstrap pipeline
//!
//! Registry errors arrive as [`ClientError`] variants and are converted by
//! kind, so recovery decisions (create on `NotFound`, succeed on
//! `AlreadyExists`) are made by matching variants.

use manta_client::ClientError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, InitError>;

/// Errors raised while converging a deployment
#[derive(Debug, Error)]
pub enum InitError {
    /// Invalid command-line input
    #[error("{0}")]
    Usage(String),

    /// Invalid deployment configuration, templates, or service bindings
    #[error("{0}")]
    Config(String),

    /// A looked-up resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// A resource being created already exists
    #[error("{0}")]
    AlreadyExists(String),

    /// The resource is already in the requested state
    #[error("{0}")]
    Conflict(String),

    /// An application of another major version is already deployed
    #[error(
        "A v{found} Manta application was found on this Triton instance which conflicts \
         with the version being deployed. You must resolve that problem before attempting \
         to deploy a new Manta application."
    )]
    VersionMismatch { found: String },

    /// No image matched any of a service's image names
    #[error("{0}")]
    ImageNotFound(String),

    /// A step read context that no earlier step wrote
    #[error("pipeline context has no {0}; the step producing it has not run")]
    MissingContext(&'static str),

    /// Any other registry, process, or I/O failure
    #[error(transparent)]
    Upstream(Box<dyn std::error::Error + Send + Sync>),
}

impl InitError {
    /// Wrap an arbitrary failure as an upstream error
    pub fn upstream(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Upstream(err.into())
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

impl From<ClientError> for InitError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(msg) => Self::NotFound(msg),
            ClientError::AlreadyExists(msg) => Self::AlreadyExists(msg),
            ClientError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Upstream(Box::new(other)),
        }
    }
}

impl From<std::io::Error> for InitError {
    fn from(err: std::io::Error) -> Self {
        Self::Upstream(Box::new(err))
    }
}

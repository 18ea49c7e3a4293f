//! Error types for the playback runtime

use thiserror::Error;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Playback runtime error types
#[derive(Error, Debug)]
pub enum Error {
    // Structural errors - fail immediately at the call site
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Backend errors
    #[error("Backend already attached to media element by {kind} backend")]
    DoubleAttachment { kind: crate::types::BackendKind },

    #[error("Manifest load failed: {0}")]
    ManifestLoadFailure(String),

    #[error("Invalid playback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Session errors
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ValidationFailure(_) | Error::Network(_))
    }

    /// Returns the error code surfaced in error events
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::DoubleAttachment { .. } => "DOUBLE_ATTACHMENT",
            Error::ManifestLoadFailure(_) => "MANIFEST_LOAD",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::ValidationFailure(_) => "VALIDATION",
            Error::Network(_) => "NETWORK",
        }
    }
}

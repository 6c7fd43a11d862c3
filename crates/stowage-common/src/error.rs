//! Common error types for the Stowage volume provisioner.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`StowageError`].
pub type StowageResult<T> = Result<T, StowageError>;

/// Common errors across the Stowage crates.
#[derive(Error, Diagnostic, Debug)]
pub enum StowageError {
    /// Volume not found.
    #[error("Volume not found: {handle}")]
    #[diagnostic(code(stowage::volume::not_found))]
    VolumeNotFound {
        /// The volume handle that was not found.
        handle: String,
    },

    /// Volume handle already allocated.
    #[error("Volume already exists: {handle}")]
    #[diagnostic(code(stowage::volume::exists))]
    VolumeExists {
        /// The handle that is already in use.
        handle: String,
    },

    /// Invalid volume handle format.
    #[error("Invalid volume handle: {handle}")]
    #[diagnostic(
        code(stowage::volume::invalid_handle),
        help("Volume handles must be alphanumeric with hyphens and underscores, 1-64 characters")
    )]
    InvalidHandle {
        /// The invalid handle.
        handle: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(stowage::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(stowage::serialization))]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(stowage::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(stowage::internal),
        help("This is a bug, please report it at https://github.com/stowage-dev/stowage/issues")
    )]
    Internal {
        /// The error message.
        message: String,
    },
}

impl From<serde_json::Error> for StowageError {
    fn from(err: serde_json::Error) -> Self {
        StowageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StowageError::VolumeNotFound {
            handle: "abc123".to_string(),
        };
        assert_eq!(err.to_string(), "Volume not found: abc123");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StowageError = io_err.into();
        assert!(matches!(err, StowageError::Io(_)));
    }
}

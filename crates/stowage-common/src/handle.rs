//! Volume handle generation and validation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{StowageError, StowageResult};

/// A validated volume handle.
///
/// Volume handles must:
/// - Be 1-64 characters long
/// - Contain only alphanumeric characters, hyphens, and underscores
/// - Start with an alphanumeric character
///
/// Base-image handles are content addresses (SHA-256 hex digests); handles for
/// per-request volumes are freshly generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeHandle(String);

impl VolumeHandle {
    /// Maximum length of a volume handle.
    pub const MAX_LENGTH: usize = 64;

    /// Create a new volume handle, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle format is invalid.
    pub fn new(handle: impl Into<String>) -> StowageResult<Self> {
        let handle = handle.into();
        Self::validate(&handle)?;
        Ok(Self(handle))
    }

    /// Generate a new random volume handle from a UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Derive the content-address handle for a root-filesystem source path.
    ///
    /// The address is the SHA-256 hex digest of the path *string*. Two
    /// different paths with identical contents get distinct handles, and a
    /// path whose contents change after first bake keeps its old handle.
    #[must_use]
    pub fn content_address(source_path: &str) -> Self {
        let digest = Sha256::digest(source_path.as_bytes());
        Self(hex::encode(digest))
    }

    /// Create a volume handle without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the handle is valid.
    #[must_use]
    pub fn new_unchecked(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate a volume handle string.
    fn validate(handle: &str) -> StowageResult<()> {
        if handle.is_empty() || handle.len() > Self::MAX_LENGTH {
            return Err(StowageError::InvalidHandle {
                handle: handle.to_string(),
            });
        }

        let first_char = handle.chars().next().unwrap();
        if !first_char.is_ascii_alphanumeric() {
            return Err(StowageError::InvalidHandle {
                handle: handle.to_string(),
            });
        }

        for c in handle.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(StowageError::InvalidHandle {
                    handle: handle.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Returns a short version of the handle (first 12 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        if self.0.len() <= 12 {
            &self.0
        } else {
            &self.0[..12]
        }
    }
}

impl fmt::Display for VolumeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VolumeHandle {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for VolumeHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_handles() {
        assert!(VolumeHandle::new("abc123").is_ok());
        assert!(VolumeHandle::new("my-volume").is_ok());
        assert!(VolumeHandle::new("my_volume").is_ok());
        assert!(VolumeHandle::new("Volume-123_test").is_ok());
    }

    #[test]
    fn invalid_handles() {
        assert!(VolumeHandle::new("").is_err());
        assert!(VolumeHandle::new("-invalid").is_err());
        assert!(VolumeHandle::new("_invalid").is_err());
        assert!(VolumeHandle::new("invalid!").is_err());
        assert!(VolumeHandle::new("a".repeat(65)).is_err());
    }

    #[test]
    fn generate_handle() {
        let h1 = VolumeHandle::generate();
        let h2 = VolumeHandle::generate();
        assert_ne!(h1, h2);
        assert_eq!(h1.as_str().len(), 36);
    }

    #[test]
    fn content_address_is_deterministic() {
        let a = VolumeHandle::content_address("/path/to/rootfs");
        let b = VolumeHandle::content_address("/path/to/rootfs");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn content_address_keys_on_path_string() {
        let a = VolumeHandle::content_address("/path/one");
        let b = VolumeHandle::content_address("/path/two");
        assert_ne!(a, b);
    }

    #[test]
    fn short_handle() {
        let h = VolumeHandle::content_address("/some/rootfs");
        assert_eq!(h.short().len(), 12);
        assert!(h.as_str().starts_with(h.short()));
    }
}

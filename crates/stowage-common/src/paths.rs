//! Standard filesystem paths for Stowage.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default root directory for Stowage data.
pub static STOWAGE_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("STOWAGE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/stowage"))
});

/// Standard paths used by the Stowage volume provisioner.
#[derive(Debug, Clone)]
pub struct StowagePaths {
    /// Root data directory (default: /var/lib/stowage).
    pub root: PathBuf,
}

impl StowagePaths {
    /// Create paths with the default root location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for driver-managed volumes.
    #[must_use]
    pub fn volumes(&self) -> PathBuf {
        self.root.join("volumes")
    }

    /// Directory for persisted volume metadata records.
    #[must_use]
    pub fn metadata(&self) -> PathBuf {
        self.root.join("metadata")
    }

    /// Metadata record file for a specific volume handle.
    #[must_use]
    pub fn metadata_record(&self, handle: &str) -> PathBuf {
        self.metadata().join(format!("{handle}.json"))
    }

    /// Create all necessary directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.volumes())?;
        std::fs::create_dir_all(self.metadata())?;
        Ok(())
    }
}

impl Default for StowagePaths {
    fn default() -> Self {
        Self {
            root: STOWAGE_ROOT.clone(),
        }
    }
}

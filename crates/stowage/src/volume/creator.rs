//! Volume creation entry point.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use stowage_common::StowageResult;

use crate::volume::{Repository, StrategyProvider, VolumeSpec};

/// Entry point used by request handling to create volumes.
///
/// Resolves the default root-filesystem path, asks the strategy provider for
/// a strategy, and asks the repository to create the resulting volume.
pub struct Creator {
    provider: Arc<dyn StrategyProvider>,
    repository: Arc<dyn Repository>,
    /// Configured default rootfs source. Read-locked for the duration of
    /// each create; updates take the write lock.
    default_rootfs: RwLock<String>,
}

impl Creator {
    /// Create a creator with the given default root-filesystem path.
    pub fn new(
        provider: Arc<dyn StrategyProvider>,
        repository: Arc<dyn Repository>,
        default_rootfs: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            repository,
            default_rootfs: RwLock::new(default_rootfs.into()),
        }
    }

    /// Create a volume for `rootfs_path`, returning its filesystem path.
    ///
    /// An empty path means "use the configured default". Concurrent creates
    /// proceed in parallel; only a default-path update serializes against
    /// them.
    ///
    /// # Errors
    ///
    /// Errors from the strategy provider and the repository are returned
    /// unchanged. When strategy resolution fails, no volume is created.
    pub fn create(&self, rootfs_path: &str) -> StowageResult<PathBuf> {
        let default_rootfs = self.default_rootfs.read();
        let rootfs_path = if rootfs_path.is_empty() {
            default_rootfs.as_str()
        } else {
            rootfs_path
        };

        let strategy = self.provider.provide_strategy(rootfs_path)?;
        let volume = self
            .repository
            .create_volume(None, VolumeSpec::with_strategy(strategy))?;

        Ok(volume.path)
    }

    /// Replace the default root-filesystem path.
    ///
    /// Takes the write lock, so the update waits for in-flight creates and
    /// blocks new ones until it lands.
    pub fn set_default_rootfs(&self, path: impl Into<String>) {
        let path = path.into();
        tracing::info!(path = %path, "Updating default rootfs");
        *self.default_rootfs.write() = path;
    }

    /// The currently configured default root-filesystem path.
    #[must_use]
    pub fn default_rootfs(&self) -> String {
        self.default_rootfs.read().clone()
    }
}

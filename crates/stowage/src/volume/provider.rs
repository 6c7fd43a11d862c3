//! Strategy resolution and the base-image cache.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use stowage_common::{StowageResult, VolumeHandle};

use crate::copier::Copier;
use crate::driver::FilesystemDriver;
use crate::volume::Strategy;

/// Decides how a new volume's content should be produced for a given
/// root-filesystem source path.
pub trait StrategyProvider: Send + Sync {
    /// Resolve the strategy for `rootfs_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the strategy required baking a base
    /// image and that failed.
    fn provide_strategy(&self, rootfs_path: &str) -> StowageResult<Strategy>;
}

/// [`StrategyProvider`] that maintains a content-addressed cache of baked
/// base images.
///
/// The first request for a given source path pays the full copy cost to bake
/// an immutable base volume; every later request returns a copy-on-write
/// strategy referencing that base, so cloning is metadata-cheap.
///
/// The cache key is the SHA-256 digest of the source *path string*, not of
/// the file contents: distinct paths with identical contents are not
/// deduplicated, and a source mutated after its first bake keeps serving the
/// original base image.
pub struct BakedImageProvider {
    driver: Arc<dyn FilesystemDriver>,
    copier: Arc<dyn Copier>,
    /// Per-handle bake locks. Serializes the lookup-miss, bake, finalize
    /// critical section so concurrent first requests for one source path
    /// produce a single bake. Entries persist for the process lifetime,
    /// bounded by the number of distinct source paths.
    baking: DashMap<VolumeHandle, Arc<Mutex<()>>>,
}

impl BakedImageProvider {
    /// Create a provider over the given driver and copier.
    pub fn new(driver: Arc<dyn FilesystemDriver>, copier: Arc<dyn Copier>) -> Self {
        Self {
            driver,
            copier,
            baking: DashMap::new(),
        }
    }

    /// Bake the base image for `rootfs_path` under `handle`.
    ///
    /// Any failure after allocation destroys the partial volume (best
    /// effort) and returns the original error unchanged.
    fn bake(&self, handle: &VolumeHandle, rootfs_path: &str) -> StowageResult<VolumeHandle> {
        let mut init = self.driver.new_volume(handle)?;

        tracing::info!(handle = %handle.short(), source = rootfs_path, "Baking base image");

        let result = self
            .copier
            .copy(std::path::Path::new(rootfs_path), init.data_path())
            .and_then(|()| init.initialize());

        match result {
            Ok(live) => {
                tracing::info!(handle = %handle.short(), "Base image baked");
                Ok(live.handle().clone())
            }
            Err(e) => {
                // Best-effort cleanup of the half-baked volume; its own
                // failure must not mask the original error.
                if let Err(cleanup) = init.destroy() {
                    tracing::warn!(
                        handle = %handle.short(),
                        error = %cleanup,
                        "Failed to clean up partially baked base image"
                    );
                }
                Err(e)
            }
        }
    }
}

impl StrategyProvider for BakedImageProvider {
    fn provide_strategy(&self, rootfs_path: &str) -> StowageResult<Strategy> {
        let handle = VolumeHandle::content_address(rootfs_path);

        let lock = self
            .baking
            .entry(handle.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        let parent = match self.driver.lookup_volume(&handle)? {
            Some(live) => {
                tracing::debug!(handle = %handle.short(), source = rootfs_path, "Base image cache hit");
                live.handle().clone()
            }
            None => self.bake(&handle, rootfs_path)?,
        };

        Ok(Strategy::Cow { parent })
    }
}

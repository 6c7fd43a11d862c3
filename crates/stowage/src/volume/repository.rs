//! The authoritative store of volume metadata.
//!
//! The repository materializes strategies into backing volumes through the
//! filesystem driver and persists one JSON record per volume, so the full
//! set of live volumes can be reconstructed after a process restart.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use parking_lot::RwLock;
use stowage_common::{StowageError, StowageResult, StowagePaths, VolumeHandle};

use crate::driver::FilesystemDriver;
use crate::volume::{Strategy, Volume, VolumeSpec};

/// Creates, destroys, and enumerates volumes.
pub trait Repository: Send + Sync {
    /// Materialize `spec` into a volume.
    ///
    /// A fresh handle is generated when `handle` is `None`. The persisted
    /// record and the backing storage are created together; on failure
    /// neither survives.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is taken, a copy-on-write parent is
    /// not live, or the driver or persistence layer fails.
    fn create_volume(
        &self,
        handle: Option<VolumeHandle>,
        spec: VolumeSpec,
    ) -> StowageResult<Volume>;

    /// Destroy a volume, freeing its backing storage and removing its
    /// record. Immediately effective for later lookups and listings.
    ///
    /// # Errors
    ///
    /// Returns [`StowageError::VolumeNotFound`] for an unknown handle, or
    /// the driver error if the backing storage could not be freed (in which
    /// case the record is kept so the destroy can be retried).
    fn destroy_volume(&self, handle: &VolumeHandle) -> StowageResult<()>;

    /// Look up a volume by handle.
    fn lookup_volume(&self, handle: &VolumeHandle) -> Option<Volume>;

    /// All currently known volumes.
    fn list_volumes(&self) -> Vec<Volume>;
}

/// [`Repository`] persisting one JSON record per volume under the metadata
/// directory.
pub struct FsRepository {
    driver: Arc<dyn FilesystemDriver>,
    paths: StowagePaths,
    volumes: RwLock<HashMap<VolumeHandle, Volume>>,
}

impl FsRepository {
    /// Open the repository, loading persisted records from disk.
    ///
    /// Records whose backing volume no longer exists (for example after a
    /// crash between a driver-level destroy and the record removal) are
    /// dropped during the load, so metadata and storage agree from the
    /// first call on.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory layout cannot be created or a
    /// record cannot be read.
    pub fn new(driver: Arc<dyn FilesystemDriver>, paths: StowagePaths) -> StowageResult<Self> {
        paths.create_dirs()?;

        let repository = Self {
            driver,
            paths,
            volumes: RwLock::new(HashMap::new()),
        };
        repository.load_records()?;
        Ok(repository)
    }

    fn load_records(&self) -> StowageResult<()> {
        let mut volumes = self.volumes.write();

        for entry in fs::read_dir(self.paths.metadata())? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = fs::read_to_string(&path)?;
            let volume: Volume = serde_json::from_str(&content)?;

            if self.driver.lookup_volume(&volume.handle)?.is_none() {
                tracing::warn!(
                    handle = %volume.handle,
                    "Dropping record without backing volume"
                );
                fs::remove_file(&path)?;
                continue;
            }

            volumes.insert(volume.handle.clone(), volume);
        }

        tracing::debug!(count = volumes.len(), "Loaded persisted volumes");
        Ok(())
    }

    fn persist(&self, volume: &Volume) -> StowageResult<()> {
        let record = self.paths.metadata_record(volume.handle.as_str());
        let json = serde_json::to_string_pretty(volume)?;
        fs::write(&record, json)?;
        Ok(())
    }
}

impl Repository for FsRepository {
    fn create_volume(
        &self,
        handle: Option<VolumeHandle>,
        spec: VolumeSpec,
    ) -> StowageResult<Volume> {
        let handle = handle.unwrap_or_else(VolumeHandle::generate);

        let mut init = match &spec.strategy {
            Strategy::Empty => self.driver.new_volume(&handle)?,
            Strategy::Cow { parent } => self.driver.clone_volume(&handle, parent)?,
        };

        let live = match init.initialize() {
            Ok(live) => live,
            Err(e) => {
                if let Err(cleanup) = init.destroy() {
                    tracing::warn!(handle = %handle, error = %cleanup, "Cleanup after failed initialize failed");
                }
                return Err(e);
            }
        };

        let volume = Volume {
            handle: handle.clone(),
            path: live.data_path().to_path_buf(),
            properties: spec.properties,
            ttl: spec.ttl,
            parent: spec.strategy.parent().cloned(),
            created_at: chrono::Utc::now(),
        };

        if let Err(e) = self.persist(&volume) {
            // No record, no volume: roll the backing storage back so a
            // failed create leaves no trace.
            if let Err(cleanup) = live.destroy() {
                tracing::warn!(handle = %handle, error = %cleanup, "Cleanup after failed persist failed");
            }
            return Err(e);
        }

        self.volumes.write().insert(handle.clone(), volume.clone());

        tracing::info!(
            handle = %handle,
            path = %volume.path.display(),
            parent = volume.parent.as_ref().map(VolumeHandle::as_str).unwrap_or("none"),
            "Volume created"
        );
        Ok(volume)
    }

    fn destroy_volume(&self, handle: &VolumeHandle) -> StowageResult<()> {
        if !self.volumes.read().contains_key(handle) {
            return Err(StowageError::VolumeNotFound {
                handle: handle.to_string(),
            });
        }

        // Storage first, record second: a crash in between is healed by the
        // reconciliation pass on the next load.
        if let Some(live) = self.driver.lookup_volume(handle)? {
            live.destroy()?;
        }

        let record = self.paths.metadata_record(handle.as_str());
        if record.exists() {
            fs::remove_file(&record)?;
        }

        self.volumes.write().remove(handle);
        tracing::info!(handle = %handle, "Volume destroyed");
        Ok(())
    }

    fn lookup_volume(&self, handle: &VolumeHandle) -> Option<Volume> {
        self.volumes.read().get(handle).cloned()
    }

    fn list_volumes(&self) -> Vec<Volume> {
        self.volumes.read().values().cloned().collect()
    }
}

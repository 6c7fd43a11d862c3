//! Directory-backed filesystem driver.
//!
//! Volumes are plain directories. An initializing volume lives at
//! `<root>/init/<handle>/volume`; finalizing it renames the handle directory
//! into `<root>/live/<handle>`, which is atomic on the same filesystem.
//! Cloning is a full copy of the parent's data directory. This backend trades
//! real copy-on-write sharing for zero external dependencies; snapshot-based
//! drivers implement the same traits.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stowage_common::{StowageError, StowageResult, VolumeHandle};

use crate::copier::copy_dir_all;
use crate::driver::{FilesystemDriver, InitVolume, LiveVolume};

const INIT_DIR: &str = "init";
const LIVE_DIR: &str = "live";
const DATA_DIR: &str = "volume";

/// [`FilesystemDriver`] backed by plain directories.
#[derive(Debug, Clone)]
pub struct DirDriver {
    /// Root directory holding `init/` and `live/` volume trees.
    root: PathBuf,
}

impl DirDriver {
    /// Create a driver rooted at `root`, creating the layout if needed.
    ///
    /// Any `init/` entries left behind by a crash are swept away: an
    /// initializing volume that never became live is garbage by definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be created or swept.
    pub fn new(root: impl Into<PathBuf>) -> StowageResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(INIT_DIR))?;
        fs::create_dir_all(root.join(LIVE_DIR))?;

        let driver = Self { root };
        driver.sweep_stale_init()?;
        Ok(driver)
    }

    /// Remove leftover initializing volumes from a previous process.
    fn sweep_stale_init(&self) -> StowageResult<()> {
        for entry in fs::read_dir(self.root.join(INIT_DIR))? {
            let entry = entry?;
            fs::remove_dir_all(entry.path())?;
            tracing::warn!(
                path = %entry.path().display(),
                "Swept stale initializing volume"
            );
        }
        Ok(())
    }

    fn init_path(&self, handle: &VolumeHandle) -> PathBuf {
        self.root.join(INIT_DIR).join(handle.as_str())
    }

    fn live_path(&self, handle: &VolumeHandle) -> PathBuf {
        self.root.join(LIVE_DIR).join(handle.as_str())
    }

    /// Allocate the init directory for `handle`.
    ///
    /// `create_dir` (not `create_dir_all`) is the atomic create-if-absent
    /// primitive here: exactly one racing caller wins the handle.
    fn allocate(&self, handle: &VolumeHandle) -> StowageResult<DirInitVolume> {
        if self.live_path(handle).exists() {
            return Err(StowageError::VolumeExists {
                handle: handle.to_string(),
            });
        }

        let init = self.init_path(handle);
        match fs::create_dir(&init) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StowageError::VolumeExists {
                    handle: handle.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let data = init.join(DATA_DIR);
        fs::create_dir(&data)?;

        Ok(DirInitVolume {
            handle: handle.clone(),
            init_path: init,
            data_path: data,
            live_parent: self.root.join(LIVE_DIR),
        })
    }
}

impl FilesystemDriver for DirDriver {
    fn new_volume(&self, handle: &VolumeHandle) -> StowageResult<Box<dyn InitVolume>> {
        let init = self.allocate(handle)?;
        tracing::debug!(handle = %handle, path = %init.data_path.display(), "Allocated volume");
        Ok(Box::new(init))
    }

    fn clone_volume(
        &self,
        handle: &VolumeHandle,
        parent: &VolumeHandle,
    ) -> StowageResult<Box<dyn InitVolume>> {
        let parent_data = self.live_path(parent).join(DATA_DIR);
        if !parent_data.is_dir() {
            return Err(StowageError::VolumeNotFound {
                handle: parent.to_string(),
            });
        }

        let init = self.allocate(handle)?;
        if let Err(e) = copy_dir_all(&parent_data, &init.data_path) {
            if let Err(cleanup) = Box::new(init).destroy() {
                tracing::warn!(handle = %handle, error = %cleanup, "Cleanup after failed clone failed");
            }
            return Err(e);
        }

        tracing::debug!(handle = %handle, parent = %parent, "Cloned volume");
        Ok(Box::new(init))
    }

    fn lookup_volume(&self, handle: &VolumeHandle) -> StowageResult<Option<Box<dyn LiveVolume>>> {
        let live = self.live_path(handle);
        if !live.is_dir() {
            return Ok(None);
        }

        Ok(Some(Box::new(DirLiveVolume {
            handle: handle.clone(),
            data_path: live.join(DATA_DIR),
            live_path: live,
        })))
    }
}

/// An initializing directory volume.
struct DirInitVolume {
    handle: VolumeHandle,
    init_path: PathBuf,
    data_path: PathBuf,
    live_parent: PathBuf,
}

impl InitVolume for DirInitVolume {
    fn handle(&self) -> &VolumeHandle {
        &self.handle
    }

    fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn initialize(&mut self) -> StowageResult<Box<dyn LiveVolume>> {
        let live = self.live_parent.join(self.handle.as_str());
        match fs::rename(&self.init_path, &live) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists || live.exists() => {
                // Lost a publish race; the existing live volume wins.
                return Err(StowageError::VolumeExists {
                    handle: self.handle.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(handle = %self.handle, path = %live.display(), "Volume initialized");
        Ok(Box::new(DirLiveVolume {
            handle: self.handle.clone(),
            data_path: live.join(DATA_DIR),
            live_path: live,
        }))
    }

    fn destroy(self: Box<Self>) -> StowageResult<()> {
        fs::remove_dir_all(&self.init_path)?;
        tracing::debug!(handle = %self.handle, "Initializing volume destroyed");
        Ok(())
    }
}

/// A live directory volume.
struct DirLiveVolume {
    handle: VolumeHandle,
    live_path: PathBuf,
    data_path: PathBuf,
}

impl LiveVolume for DirLiveVolume {
    fn handle(&self) -> &VolumeHandle {
        &self.handle
    }

    fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn destroy(self: Box<Self>) -> StowageResult<()> {
        fs::remove_dir_all(&self.live_path)?;
        tracing::info!(handle = %self.handle, "Volume destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn handle(s: &str) -> VolumeHandle {
        VolumeHandle::new(s).unwrap()
    }

    #[test]
    fn new_volume_then_initialize_is_addressable() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();
        let h = handle("base-1");

        let mut init = driver.new_volume(&h).unwrap();
        fs::write(init.data_path().join("hello"), "world").unwrap();
        let live = init.initialize().unwrap();

        assert_eq!(live.handle(), &h);
        assert_eq!(
            fs::read_to_string(live.data_path().join("hello")).unwrap(),
            "world"
        );

        let found = driver.lookup_volume(&h).unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn lookup_missing_volume_is_none() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();

        assert!(driver.lookup_volume(&handle("nope")).unwrap().is_none());
    }

    #[test]
    fn duplicate_allocation_is_rejected() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();
        let h = handle("contested");

        let _winner = driver.new_volume(&h).unwrap();
        let loser = driver.new_volume(&h);
        assert!(matches!(loser, Err(StowageError::VolumeExists { .. })));
    }

    #[test]
    fn allocation_of_live_handle_is_rejected() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();
        let h = handle("taken");

        driver.new_volume(&h).unwrap().initialize().unwrap();

        let again = driver.new_volume(&h);
        assert!(matches!(again, Err(StowageError::VolumeExists { .. })));
    }

    #[test]
    fn destroy_init_volume_frees_handle() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();
        let h = handle("aborted");

        driver.new_volume(&h).unwrap().destroy().unwrap();

        // Handle is free again after the abort.
        let retry = driver.new_volume(&h);
        assert!(retry.is_ok());
    }

    #[test]
    fn destroy_live_volume_removes_it() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();
        let h = handle("doomed");

        driver.new_volume(&h).unwrap().initialize().unwrap();
        driver.lookup_volume(&h).unwrap().unwrap().destroy().unwrap();

        assert!(driver.lookup_volume(&h).unwrap().is_none());
    }

    #[test]
    fn clone_copies_parent_contents() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();
        let parent = handle("parent");
        let child = handle("child");

        let mut init = driver.new_volume(&parent).unwrap();
        fs::write(init.data_path().join("shared"), "data").unwrap();
        init.initialize().unwrap();

        let clone = driver.clone_volume(&child, &parent).unwrap();
        assert_eq!(
            fs::read_to_string(clone.data_path().join("shared")).unwrap(),
            "data"
        );

        // Writes to the clone do not touch the parent.
        fs::write(clone.data_path().join("diverged"), "x").unwrap();
        let parent_live = driver.lookup_volume(&parent).unwrap().unwrap();
        assert!(!parent_live.data_path().join("diverged").exists());
    }

    #[test]
    fn clone_from_missing_parent_fails() {
        let temp = tempdir().unwrap();
        let driver = DirDriver::new(temp.path()).unwrap();

        let result = driver.clone_volume(&handle("child"), &handle("ghost"));
        assert!(matches!(result, Err(StowageError::VolumeNotFound { .. })));
    }

    #[test]
    fn stale_init_volumes_are_swept_on_startup() {
        let temp = tempdir().unwrap();
        {
            let driver = DirDriver::new(temp.path()).unwrap();
            // Simulate a crash mid-bake: init volume never finalized.
            let _abandoned = driver.new_volume(&handle("half-baked")).unwrap();
        }

        let driver = DirDriver::new(temp.path()).unwrap();
        assert!(driver.new_volume(&handle("half-baked")).is_ok());
    }

    #[test]
    fn live_volumes_survive_driver_restart() {
        let temp = tempdir().unwrap();
        let h = handle("durable");
        {
            let driver = DirDriver::new(temp.path()).unwrap();
            driver.new_volume(&h).unwrap().initialize().unwrap();
        }

        let driver = DirDriver::new(temp.path()).unwrap();
        assert!(driver.lookup_volume(&h).unwrap().is_some());
    }
}

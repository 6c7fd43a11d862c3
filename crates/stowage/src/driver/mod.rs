//! Low-level volume lifecycle contract.
//!
//! A driver manages volumes on the backing store. Every volume passes
//! through two states: *initializing* (mutable, being populated, not yet
//! addressable) and *live* (finalized, immutable at the driver level,
//! addressable by handle). The provisioning core only ever talks to these
//! traits; how copy-on-write is actually implemented (btrfs subvolumes,
//! overlay mounts, plain directories) is a driver concern.

mod dir;

pub use dir::DirDriver;

use std::path::Path;

use stowage_common::{StowageResult, VolumeHandle};

/// A volume that is still being populated.
///
/// An init volume ends in exactly one of two ways: a successful
/// [`initialize`](InitVolume::initialize), or [`destroy`](InitVolume::destroy).
/// After a failed initialize the caller must destroy it.
pub trait InitVolume: Send {
    /// The handle this volume was allocated under.
    fn handle(&self) -> &VolumeHandle;

    /// Filesystem path for populating content before finalization.
    fn data_path(&self) -> &Path;

    /// Finalize the volume, making it addressable and immutable.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to publish the volume; the init
    /// volume remains destroyable.
    fn initialize(&mut self) -> StowageResult<Box<dyn LiveVolume>>;

    /// Abandon an in-progress volume, freeing any partial state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing state could not be removed.
    fn destroy(self: Box<Self>) -> StowageResult<()>;
}

/// A finalized volume, addressable by handle.
pub trait LiveVolume: Send {
    /// The volume's handle.
    fn handle(&self) -> &VolumeHandle;

    /// Filesystem path clients read and write through.
    fn data_path(&self) -> &Path;

    /// Destroy the volume, freeing its backing storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage could not be removed.
    fn destroy(self: Box<Self>) -> StowageResult<()>;
}

/// Creates, clones, and looks up volumes on the backing store.
///
/// The driver's handle namespace is the single source of mutual exclusion
/// for volume allocation: [`FilesystemDriver::new_volume`] must reject a
/// duplicate handle atomically, so that racing callers get a single winner
/// rather than a corrupted volume.
pub trait FilesystemDriver: Send + Sync {
    /// Allocate a new empty volume under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`StowageError::VolumeExists`](stowage_common::StowageError::VolumeExists)
    /// if the handle is already in use, or an I/O error if allocation fails.
    fn new_volume(&self, handle: &VolumeHandle) -> StowageResult<Box<dyn InitVolume>>;

    /// Allocate a new volume under `handle` as a copy-on-write clone of the
    /// live volume `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is taken, the parent is not live, or
    /// cloning fails.
    fn clone_volume(
        &self,
        handle: &VolumeHandle,
        parent: &VolumeHandle,
    ) -> StowageResult<Box<dyn InitVolume>>;

    /// Look up a live volume by handle.
    ///
    /// # Errors
    ///
    /// Returns an error only on driver-level failure; an absent handle is
    /// `Ok(None)`.
    fn lookup_volume(&self, handle: &VolumeHandle) -> StowageResult<Option<Box<dyn LiveVolume>>>;
}

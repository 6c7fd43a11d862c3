//! # stowage
//!
//! Volume provisioning core for container-like workloads.
//!
//! Volumes are isolated, copy-on-write root filesystems. The first request
//! for a given root-filesystem source bakes an immutable, content-addressed
//! base volume; every later request clones from that base. Volume metadata
//! is persisted so the set of live volumes survives a process restart, and
//! explicit destruction frees both the record and the backing storage.
//!
//! The crate is organized around three seams:
//! - [`driver`] — the low-level volume lifecycle contract plus a
//!   directory-backed implementation
//! - [`copier`] — the mechanism used to populate a base volume from a source
//! - [`volume`] — strategies, the base-image cache, the repository, and the
//!   creator entry point

#![warn(missing_docs)]

pub mod copier;
pub mod driver;
pub mod volume;

pub use copier::{Copier, FsCopier};
pub use driver::{DirDriver, FilesystemDriver, InitVolume, LiveVolume};
pub use volume::{
    BakedImageProvider, Creator, FsRepository, Properties, Repository, Strategy, StrategyProvider,
    Volume, VolumeSpec,
};

//! Volume provisioning: strategies, the base-image cache, persistence, and
//! the creation entry point.

mod creator;
mod provider;
mod repository;
mod strategy;

pub use creator::Creator;
pub use provider::{BakedImageProvider, StrategyProvider};
pub use repository::{FsRepository, Repository};
pub use strategy::Strategy;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stowage_common::VolumeHandle;

/// Arbitrary client metadata attached to a volume.
pub type Properties = HashMap<String, String>;

/// A provisioned volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    /// Unique handle assigned at creation.
    pub handle: VolumeHandle,
    /// Filesystem path clients read and write through.
    pub path: PathBuf,
    /// Arbitrary client metadata.
    pub properties: Properties,
    /// Time-to-live in seconds; zero means no expiry is managed here.
    pub ttl: u64,
    /// Set when the volume was cloned copy-on-write from a base volume.
    ///
    /// This is a non-owning back-reference: destroying the parent is
    /// independent of its children.
    pub parent: Option<VolumeHandle>,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A client request describing the volume to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// How the volume's initial content is produced.
    pub strategy: Strategy,
    /// Metadata to attach to the volume.
    #[serde(default)]
    pub properties: Properties,
    /// Time-to-live in seconds; zero means no expiry.
    #[serde(default)]
    pub ttl: u64,
}

impl VolumeSpec {
    /// Spec for a volume using `strategy` with no properties and no expiry.
    #[must_use]
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            properties: Properties::new(),
            ttl: 0,
        }
    }
}

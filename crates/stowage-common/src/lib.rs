//! # stowage-common
//!
//! Shared utilities and types for the Stowage volume provisioner.
//!
//! This crate provides common functionality used across all Stowage crates:
//! - Volume handle generation and validation
//! - Standard filesystem paths
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod handle;
pub mod paths;

pub use error::{StowageError, StowageResult};
pub use handle::VolumeHandle;
pub use paths::StowagePaths;

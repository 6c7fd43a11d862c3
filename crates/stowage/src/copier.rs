//! Copying root-filesystem sources into volumes.
//!
//! Baking a base image means copying an entire source tree into a freshly
//! allocated volume. The mechanism sits behind the [`Copier`] trait so the
//! provisioning logic can be exercised without touching the filesystem.

use std::fs;
use std::path::Path;

use stowage_common::StowageResult;

/// Copies the contents of a source directory into a destination directory.
pub trait Copier: Send + Sync {
    /// Copy everything under `src` into `dst`.
    ///
    /// `dst` must already exist. On failure the destination may hold a
    /// partial copy; the caller is responsible for cleanup.
    fn copy(&self, src: &Path, dst: &Path) -> StowageResult<()>;
}

/// [`Copier`] backed by a recursive in-process directory walk.
#[derive(Debug, Default, Clone)]
pub struct FsCopier;

impl FsCopier {
    /// Create a new filesystem copier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Copier for FsCopier {
    fn copy(&self, src: &Path, dst: &Path) -> StowageResult<()> {
        tracing::debug!(src = %src.display(), dst = %dst.display(), "Copying source tree");
        copy_dir_all(src, dst)
    }
}

/// Recursively copy the contents of `src` into `dst`.
///
/// Directories are created as needed; regular files are copied with their
/// permissions. `dst` itself must already exist.
pub fn copy_dir_all(src: &Path, dst: &Path) -> StowageResult<()> {
    for entry in walkdir::WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
        // Symlinks and special files are skipped; the directory driver is a
        // development backend, not a production rootfs store.
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_nested_tree() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("etc/nested")).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("etc/hostname"), "banana").unwrap();
        fs::write(src.join("etc/nested/config"), "key=value").unwrap();

        FsCopier::new().copy(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("etc/hostname")).unwrap(), "banana");
        assert_eq!(
            fs::read_to_string(dst.join("etc/nested/config")).unwrap(),
            "key=value"
        );
    }

    #[test]
    fn missing_source_fails() {
        let temp = tempdir().unwrap();
        let dst = temp.path().join("dst");
        fs::create_dir_all(&dst).unwrap();

        let result = FsCopier::new().copy(&temp.path().join("nope"), &dst);
        assert!(result.is_err());
    }

    #[test]
    fn empty_source_copies_nothing() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();

        FsCopier::new().copy(&src, &dst).unwrap();
        assert_eq!(fs::read_dir(&dst).unwrap().count(), 0);
    }
}

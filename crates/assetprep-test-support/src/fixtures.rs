//! Temporary asset trees and digest helpers.

use std::fs;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tempfile::TempDir;

/// A temporary directory populated from `(relative path, bytes)` pairs.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct TempTree {
    dir: TempDir,
}

impl TempTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory cannot be created.
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new().prefix("assetprep-").tempdir()?;
        Ok(Self { dir })
    }

    /// Create a tree containing `entries`. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error when any directory or file cannot be written.
    pub fn with_files<P, B>(entries: impl IntoIterator<Item = (P, B)>) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
        B: AsRef<[u8]>,
    {
        let tree = Self::new()?;
        for (relative, bytes) in entries {
            tree.write(relative, bytes)?;
        }
        Ok(tree)
    }

    /// Write one file into the tree, returning its absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error when the file or its parents cannot be written.
    pub fn write(&self, relative: impl AsRef<Path>, bytes: impl AsRef<[u8]>) -> anyhow::Result<PathBuf> {
        let target = self.dir.path().join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        Ok(target)
    }

    /// Create an empty directory inside the tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn mkdir(&self, relative: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let target = self.dir.path().join(relative);
        fs::create_dir_all(&target)?;
        Ok(target)
    }

    /// Root of the tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the tree.
    #[must_use]
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }
}

/// Lowercase hex MD5 digest of `bytes`, for expected values in assertions.
#[must_use]
pub fn md5_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(Md5::digest(bytes.as_ref()))
}

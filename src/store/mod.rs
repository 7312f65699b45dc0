//! Backing stores for the virtual file system.
//!
//! This module handles:
//! - The read-only store capability shared by plain and sealed stores
//! - An in-memory store for compiled-in blobs
//! - A directory store for blobs loaded from disk at process start

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::vfs::{join, walk_dir, FileInfo, Handle, WalkControl};

/// A read-only hierarchical store addressed by slash-separated paths.
///
/// Implemented by the plain stores in this module and by
/// [`EncryptedFs`](crate::vfs::EncryptedFs), so the walker, glob and sync
/// utilities take either. Stores are immutable, so independent callers may
/// read the same store concurrently as long as each uses its own handles.
pub trait BlobStore {
    /// Open a file or directory.
    fn open(&self, path: &str) -> Result<Handle>;

    /// Names of the entries of a directory, in the store's natural order.
    fn names(&self, dir: &str) -> Result<Vec<String>>;

    /// Metadata of a file or directory.
    fn stat(&self, path: &str) -> Result<FileInfo> {
        let handle = self.open(path)?;
        let info = handle.info().clone();
        handle.close();
        Ok(info)
    }

    /// Metadata of every entry of a directory, in [`names`](Self::names) order.
    ///
    /// The order is whatever the store enumerates; it is only lexicographic
    /// when the store sorts.
    fn read_dir(&self, dir: &str) -> Result<Vec<FileInfo>> {
        self.names(dir)?
            .iter()
            .map(|name| self.stat(&join(dir, name)))
            .collect()
    }

    /// Whole content of a file.
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut handle = self.open(path)?;
        let data = handle.read_remaining()?;
        handle.close();
        Ok(data)
    }

    /// Pre-order walk starting at `root`; see [`walk_dir`].
    fn walk<F>(&self, root: &str, visit: F) -> Result<()>
    where
        Self: Sized,
        F: FnMut(&str, Result<FileInfo>) -> Result<WalkControl>,
    {
        walk_dir(self, root, visit)
    }
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn open(&self, path: &str) -> Result<Handle> {
        (**self).open(path)
    }

    fn names(&self, dir: &str) -> Result<Vec<String>> {
        (**self).names(dir)
    }

    fn stat(&self, path: &str) -> Result<FileInfo> {
        (**self).stat(path)
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<FileInfo>> {
        (**self).read_dir(dir)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read_file(path)
    }
}

//! Store backed by a directory on the real file system.

use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::vfs::{FileInfo, Handle, VfsPath};
use std::fs;
use std::io;
use std::path::PathBuf;
use walkdir::WalkDir;
use zeroize::Zeroizing;

/// A directory of blobs on disk, read at access time.
///
/// Entries enumerate sorted by file name so listings do not depend on the
/// host file system's directory order.
#[derive(Debug, Clone)]
pub struct DirStore {
    /// Root directory of the store.
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| not_found(e, &root.display().to_string()))?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(root.display().to_string()));
        }
        Ok(Self { root })
    }

    /// Resolve a store path to a real path under the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let vfs_path = VfsPath::parse(path)?;
        let mut resolved = self.root.clone();
        for component in vfs_path.components() {
            resolved.push(component);
        }
        Ok(resolved)
    }
}

/// Map a missing file onto [`Error::NotFound`] for the store path.
fn not_found(e: io::Error, path: &str) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::NotFound(path.to_string())
    } else {
        Error::Io(e)
    }
}

impl BlobStore for DirStore {
    fn open(&self, path: &str) -> Result<Handle> {
        let info = self.stat(path)?;
        if info.is_dir {
            return Ok(Handle::directory(path, info));
        }

        let data = fs::read(self.resolve(path)?).map_err(|e| not_found(e, path))?;
        Ok(Handle::file(path, info, Zeroizing::new(data)))
    }

    fn names(&self, dir: &str) -> Result<Vec<String>> {
        let resolved = self.resolve(dir)?;
        let metadata = fs::metadata(&resolved).map_err(|e| not_found(e, dir))?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(dir.to_string()));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&resolved)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn stat(&self, path: &str) -> Result<FileInfo> {
        let resolved = self.resolve(path)?;
        let metadata = fs::metadata(&resolved).map_err(|e| not_found(e, path))?;
        let name = VfsPath::parse(path)?.name().to_string();
        Ok(FileInfo::from_metadata(name, &metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin/tool"), b"tool").unwrap();
        fs::write(dir.path().join("zeta.txt"), b"z").unwrap();
        fs::write(dir.path().join("alpha.txt"), b"alpha").unwrap();
        dir
    }

    #[test]
    fn test_new_requires_directory() {
        let dir = sample();
        assert!(DirStore::new(dir.path()).is_ok());
        assert!(matches!(
            DirStore::new(dir.path().join("alpha.txt")),
            Err(Error::NotADirectory(_))
        ));
        assert!(DirStore::new(dir.path().join("missing"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_names_sorted() {
        let dir = sample();
        let store = DirStore::new(dir.path()).unwrap();
        assert_eq!(store.names(".").unwrap(), vec!["alpha.txt", "bin", "zeta.txt"]);
        assert_eq!(store.names("bin").unwrap(), vec!["tool"]);
        assert!(matches!(store.names("zeta.txt"), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_open_and_stat() {
        let dir = sample();
        let store = DirStore::new(dir.path()).unwrap();

        assert_eq!(store.read_file("bin/tool").unwrap(), b"tool");
        let info = store.stat("alpha.txt").unwrap();
        assert_eq!(info.name, "alpha.txt");
        assert_eq!(info.size, 5);
        assert!(store.stat(".").unwrap().is_dir);
        assert_eq!(store.stat(".").unwrap().name, ".");
        assert!(matches!(store.stat("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let dir = sample();
        let store = DirStore::new(dir.path()).unwrap();
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
    }
}

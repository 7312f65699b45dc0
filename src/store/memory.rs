//! In-memory store for blobs compiled into the binary.

use crate::config::{DEFAULT_DIR_MODE, FALLBACK_MODE};
use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::vfs::{base, FileInfo, Handle, VfsPath};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use walkdir::WalkDir;
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
enum Node {
    Dir {
        mode: u32,
        modified: SystemTime,
    },
    File {
        data: Cow<'static, [u8]>,
        mode: u32,
        modified: SystemTime,
    },
}

/// An immutable table of files keyed by slash path.
///
/// Parent directories are created implicitly. Entries enumerate in
/// lexicographic order, like an embedded file table.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    nodes: BTreeMap<String, Node>,
}

impl MemoryStore {
    /// Create an empty store containing only the root.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            ".".to_string(),
            Node::Dir {
                mode: DEFAULT_DIR_MODE,
                modified: UNIX_EPOCH,
            },
        );
        Self { nodes }
    }

    /// Build a store from a static table, e.g. entries made with `include_bytes!`.
    ///
    /// Static entries carry no modification time; they report the Unix epoch.
    pub fn from_static(entries: &[(&'static str, &'static [u8])]) -> Result<Self> {
        let mut store = Self::new();
        for (path, data) in entries {
            store.insert_file(path, Cow::Borrowed(*data), UNIX_EPOCH)?;
        }
        Ok(store)
    }

    /// Load every file under `root` into memory, keeping mtimes and modes.
    pub fn load_dir(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.display().to_string()));
        }

        let mut store = Self::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| Error::InvalidPath(e.to_string()))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let metadata = entry.metadata().map_err(|e| Error::Io(e.into()))?;
            let info = FileInfo::from_metadata(base(&key), &metadata);
            if entry.file_type().is_dir() {
                store.insert_dir_with(&key, info.mode, info.modified)?;
            } else if entry.file_type().is_file() {
                let data = fs::read(entry.path())?;
                store.insert_file_with(&key, Cow::Owned(data), info.mode, info.modified)?;
            }
        }

        debug!("Loaded {} entries from {}", store.len(), root.display());
        Ok(store)
    }

    /// Insert a directory, creating missing parents.
    pub fn insert_dir(&mut self, path: &str) -> Result<()> {
        self.insert_dir_with(path, DEFAULT_DIR_MODE, UNIX_EPOCH)
    }

    /// Insert a directory with explicit mode and mtime.
    pub fn insert_dir_with(&mut self, path: &str, mode: u32, modified: SystemTime) -> Result<()> {
        let vfs_path = VfsPath::parse(path)?;
        if let Some(parent) = vfs_path.parent() {
            self.ensure_dir(&parent)?;
        }
        match self.nodes.get(path) {
            Some(Node::File { .. }) => Err(Error::NotADirectory(path.to_string())),
            _ => {
                self.nodes
                    .insert(vfs_path.to_string(), Node::Dir { mode, modified });
                Ok(())
            }
        }
    }

    /// Insert a file, creating missing parents.
    pub fn insert_file(
        &mut self,
        path: &str,
        data: impl Into<Cow<'static, [u8]>>,
        modified: SystemTime,
    ) -> Result<()> {
        self.insert_file_with(path, data, FALLBACK_MODE, modified)
    }

    /// Insert a file with explicit mode.
    pub fn insert_file_with(
        &mut self,
        path: &str,
        data: impl Into<Cow<'static, [u8]>>,
        mode: u32,
        modified: SystemTime,
    ) -> Result<()> {
        let vfs_path = VfsPath::parse(path)?;
        let parent = vfs_path
            .parent()
            .ok_or_else(|| Error::InvalidPath("Cannot insert a file at the root".to_string()))?;
        self.ensure_dir(&parent)?;

        if let Some(Node::Dir { .. }) = self.nodes.get(path) {
            return Err(Error::IsADirectory(path.to_string()));
        }
        self.nodes.insert(
            vfs_path.to_string(),
            Node::File {
                data: data.into(),
                mode,
                modified,
            },
        );
        Ok(())
    }

    fn ensure_dir(&mut self, path: &VfsPath) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(&parent)?;
        }
        let key = path.to_string();
        match self.nodes.get(&key) {
            Some(Node::Dir { .. }) => Ok(()),
            Some(Node::File { .. }) => Err(Error::NotADirectory(key)),
            None => {
                self.nodes.insert(
                    key,
                    Node::Dir {
                        mode: DEFAULT_DIR_MODE,
                        modified: UNIX_EPOCH,
                    },
                );
                Ok(())
            }
        }
    }

    fn node(&self, path: &str) -> Result<&Node> {
        VfsPath::parse(path)?;
        self.nodes
            .get(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    fn info(path: &str, node: &Node) -> FileInfo {
        match node {
            Node::Dir { mode, modified } => FileInfo::directory(base(path), *mode, *modified),
            Node::File {
                data,
                mode,
                modified,
            } => FileInfo::file(base(path), data.len() as u64, *mode, *modified),
        }
    }

    /// Number of entries, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the store holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryStore {
    fn open(&self, path: &str) -> Result<Handle> {
        let node = self.node(path)?;
        let info = Self::info(path, node);
        match node {
            Node::Dir { .. } => Ok(Handle::directory(path, info)),
            Node::File { data, .. } => Ok(Handle::file(path, info, Zeroizing::new(data.to_vec()))),
        }
    }

    fn names(&self, dir: &str) -> Result<Vec<String>> {
        match self.node(dir)? {
            Node::File { .. } => return Err(Error::NotADirectory(dir.to_string())),
            Node::Dir { .. } => {}
        }

        let prefix = if dir == "." {
            String::new()
        } else {
            format!("{}/", dir)
        };

        Ok(self
            .nodes
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&prefix))
            .filter_map(|key| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && rest != "." && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    fn stat(&self, path: &str) -> Result<FileInfo> {
        self.node(path).map(|node| Self::info(path, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert_file("bin/gopher.png", b"png".to_vec(), UNIX_EPOCH)
            .unwrap();
        store
            .insert_file("bin-notes.txt", b"notes".to_vec(), UNIX_EPOCH)
            .unwrap();
        store
            .insert_file("bin/deep/x", b"x".to_vec(), UNIX_EPOCH)
            .unwrap();
        store
            .insert_file("hello.txt", b"hello".to_vec(), UNIX_EPOCH)
            .unwrap();
        store
    }

    #[test]
    fn test_parents_created() {
        let store = sample();
        assert!(store.stat("bin").unwrap().is_dir);
        assert!(store.stat("bin/deep").unwrap().is_dir);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_names_are_direct_children_sorted() {
        let store = sample();
        assert_eq!(
            store.names(".").unwrap(),
            vec!["bin", "bin-notes.txt", "hello.txt"]
        );
        assert_eq!(store.names("bin").unwrap(), vec!["deep", "gopher.png"]);
        assert!(store.names("bin/deep/x").is_err());
        assert!(store.names("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_file_and_stat() {
        let store = sample();
        assert_eq!(store.read_file("hello.txt").unwrap(), b"hello");

        let info = store.stat("bin/gopher.png").unwrap();
        assert_eq!(info.name, "gopher.png");
        assert_eq!(info.size, 3);
        assert!(!info.is_dir);
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let store = sample();
        assert!(matches!(store.stat("/hello.txt"), Err(Error::InvalidPath(_))));
        assert!(matches!(store.open("bin/../hello.txt"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_file_and_dir_conflicts() {
        let mut store = sample();
        assert!(store.insert_file("bin", b"x".to_vec(), UNIX_EPOCH).is_err());
        assert!(store.insert_dir("hello.txt").is_err());
        assert!(store.insert_file("hello.txt/child", b"x".to_vec(), UNIX_EPOCH).is_err());
        assert!(store.insert_file(".", b"x".to_vec(), UNIX_EPOCH).is_err());
    }

    #[test]
    fn test_from_static() {
        static DATA: &[u8] = b"static bytes";
        let store = MemoryStore::from_static(&[("assets/a.bin", DATA)]).unwrap();
        assert_eq!(store.read_file("assets/a.bin").unwrap(), DATA);
        assert_eq!(store.stat("assets/a.bin").unwrap().modified, UNIX_EPOCH);
    }

    #[test]
    fn test_load_dir_keeps_mtime() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let file = dir.path().join("sub/data.bin");
        std::fs::write(&file, b"0123").unwrap();
        let mtime = UNIX_EPOCH + Duration::from_secs(1_234_567_890);
        filetime::set_file_mtime(&file, filetime::FileTime::from_system_time(mtime)).unwrap();

        let store = MemoryStore::load_dir(dir.path()).unwrap();
        let info = store.stat("sub/data.bin").unwrap();
        assert_eq!(info.size, 4);
        assert_eq!(info.modified, mtime);
        assert_eq!(store.names(".").unwrap(), vec!["sub"]);
    }
}

//! Mapping of virtual paths onto a destination tree.

use crate::vfs::normalize;
use std::path::{Path, PathBuf};

/// Where a sync run writes.
///
/// Mirrors `xcopy embed:\src root\trg\`: the components of `src` above its
/// last element are dropped, the rest is placed under `root/trg`. With `a`
/// and `b/c` in the store and `root = /tmp`:
///
/// - `src = "."`, `trg = ""` gives `/tmp/a` and `/tmp/b/c`
/// - `src = "b"`, `trg = ""` gives `/tmp/b/c`
/// - `src = "b"`, `trg = "d"` gives `/tmp/d/b/c`
#[derive(Debug, Clone)]
pub struct Target {
    /// Normalized source path in the store.
    src: String,
    /// Destination directory: `root/trg`.
    base: PathBuf,
    /// Leading path components dropped from every virtual path.
    skip: usize,
}

impl Target {
    /// Create a mapping; `src` and `trg` accept `\` or `/` separators.
    pub fn new(src: &str, root: &Path, trg: &str) -> Self {
        let src = normalize(src);
        let skip = src.matches('/').count();

        let mut base = root.to_path_buf();
        for component in normalize(trg).split('/').filter(|c| *c != ".") {
            base.push(component);
        }

        Self { src, base, skip }
    }

    /// Source path to walk.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Destination directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Destination of a visited virtual path.
    pub fn destination(&self, path: &str) -> PathBuf {
        let mut dest = self.base.clone();
        for component in path
            .split('/')
            .skip(self.skip)
            .filter(|c| !c.is_empty() && *c != ".")
        {
            dest.push(component);
        }
        dest
    }

    /// Key of a visited path in the sync mapping: the path relative to `src`.
    pub fn key<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.src.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    }
}

//! VFS types: file metadata as presented to callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata of a file or directory.
///
/// For sealed files `name`, `size` and `modified` describe the original
/// plaintext file: suffix stripped, decrypted length, original mtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Base name of the entry (`.` for the root).
    pub name: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
    /// Last modification time.
    pub modified: SystemTime,
    /// Whether this is a directory.
    pub is_dir: bool,
}

impl FileInfo {
    /// Create a file entry.
    pub fn file(name: impl Into<String>, size: u64, mode: u32, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            size,
            mode,
            modified,
            is_dir: false,
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>, mode: u32, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mode,
            modified,
            is_dir: true,
        }
    }

    /// Build from real file system metadata.
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        let mode = permission_bits(metadata);
        if metadata.is_dir() {
            Self::directory(name, mode, modified)
        } else {
            Self::file(name, metadata.len(), mode, modified)
        }
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// `ls -l` style mode string, e.g. `drwxr-xr-x`.
    pub fn mode_string(&self) -> String {
        let mut out = String::with_capacity(10);
        out.push(if self.is_dir { 'd' } else { '-' });
        for shift in [6u32, 3, 0] {
            let bits = (self.mode >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }

    /// Modification time as seconds since the Unix epoch.
    pub fn modified_unix(&self) -> i64 {
        match self.modified.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        }
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = if self.is_dir {
            "-".to_string()
        } else {
            self.size.to_string()
        };
        write!(
            f,
            "{} {:>10} {:>12}  {}",
            self.mode_string(),
            size,
            self.modified_unix(),
            self.name
        )
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    use crate::config::FALLBACK_MODE;

    let base = if metadata.permissions().readonly() {
        FALLBACK_MODE
    } else {
        FALLBACK_MODE | 0o200
    };
    if metadata.is_dir() {
        base | 0o111
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_file() {
        let t = UNIX_EPOCH + Duration::from_secs(10);
        let file = FileInfo::file("test.txt", 1024, 0o644, t);

        assert_eq!(file.name, "test.txt");
        assert!(file.is_file());
        assert!(!file.is_dir);
        assert_eq!(file.size, 1024);
        assert_eq!(file.modified_unix(), 10);
    }

    #[test]
    fn test_new_directory() {
        let dir = FileInfo::directory("docs", 0o755, UNIX_EPOCH);

        assert_eq!(dir.name, "docs");
        assert!(dir.is_dir);
        assert_eq!(dir.size, 0);
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(
            FileInfo::directory("d", 0o755, UNIX_EPOCH).mode_string(),
            "drwxr-xr-x"
        );
        assert_eq!(
            FileInfo::file("f", 0, 0o640, UNIX_EPOCH).mode_string(),
            "-rw-r-----"
        );
    }

    #[test]
    fn test_display() {
        let line = FileInfo::file("hello.txt", 5, 0o644, UNIX_EPOCH).to_string();
        assert!(line.starts_with("-rw-r--r--"));
        assert!(line.ends_with("  hello.txt"));
    }
}

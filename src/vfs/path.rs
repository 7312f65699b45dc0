//! Virtual path handling and blob naming.

use crate::config::BLOB_SUFFIX;
use crate::error::{Error, Result};

/// A validated virtual path.
///
/// Paths are slash-separated and unrooted, with `.` naming the root, the
/// same shape an embedded file table uses: `bin/gopher.png`, never
/// `/bin/gopher.png` or `bin/../bin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VfsPath {
    components: Vec<String>,
}

impl VfsPath {
    /// Parse a path string.
    pub fn parse(path: &str) -> Result<Self> {
        if path == "." {
            return Ok(Self::root());
        }
        if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
            return Err(Error::InvalidPath(format!(
                "Path must be unrooted without trailing slash: {:?}",
                path
            )));
        }

        let components: Vec<String> = path.split('/').map(|s| s.to_string()).collect();

        for component in &components {
            if component.is_empty() || component == "." || component == ".." {
                return Err(Error::InvalidPath(format!(
                    "Invalid path component in {:?}",
                    path
                )));
            }
        }

        Ok(Self { components })
    }

    /// The root path `.`.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Get path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Get the parent path.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self {
                components: self.components[..self.components.len() - 1].to_vec(),
            })
        }
    }

    /// Get the file/directory name (last component), `.` for the root.
    pub fn name(&self) -> &str {
        self.components.last().map(|s| s.as_str()).unwrap_or(".")
    }
}

impl std::fmt::Display for VfsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.components.join("/"))
        }
    }
}

/// Join a directory path string and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Last element of a path string.
pub fn base(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Name of the sealed blob backing a virtual file.
pub fn blob_name(virtual_path: &str) -> String {
    format!("{}{}", virtual_path, BLOB_SUFFIX)
}

/// Virtual name of a blob, with the suffix stripped.
///
/// Names without the suffix (directories) map to themselves.
pub fn virtual_name(blob_path: &str) -> &str {
    blob_path.strip_suffix(BLOB_SUFFIX).unwrap_or(blob_path)
}

/// Normalize a user supplied path: backslashes become slashes, surrounding
/// slashes are dropped and an empty path means the root.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let path = VfsPath::parse(".").unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_string(), ".");
        assert_eq!(path.name(), ".");
    }

    #[test]
    fn test_parse_simple() {
        let path = VfsPath::parse("foo/bar").unwrap();
        assert!(!path.is_root());
        assert_eq!(path.components(), &["foo", "bar"]);
        assert_eq!(path.to_string(), "foo/bar");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in ["", "/foo", "foo/", "foo//bar", "./foo", "foo/../bar", ".."] {
            assert!(VfsPath::parse(bad).is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_parent() {
        let path = VfsPath::parse("foo/bar/baz").unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "foo/bar");
        assert!(VfsPath::parse("foo").unwrap().parent().unwrap().is_root());
        assert!(VfsPath::root().parent().is_none());
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(join(".", "bin"), "bin");
        assert_eq!(join("bin", "gopher.png"), "bin/gopher.png");
        assert_eq!(base("bin/gopher.png"), "gopher.png");
        assert_eq!(base("hello.txt"), "hello.txt");
        assert_eq!(base("."), ".");
    }

    #[test]
    fn test_blob_name_inverse() {
        for v in ["hello.txt", "bin/gopher.png", "with spaces .txt", "a.enc.txt"] {
            assert_eq!(virtual_name(&blob_name(v)), v);
        }
        // directories carry no suffix and are fixed points
        for d in [".", "bin", "bin/nested"] {
            assert_eq!(virtual_name(d), d);
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("/"), ".");
        assert_eq!(normalize(r"bin\tools"), "bin/tools");
        assert_eq!(normalize("bin/"), "bin");
        assert_eq!(normalize("."), ".");
    }
}

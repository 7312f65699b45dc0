//! Sealing plaintext files on disk into `.enc` blobs.
//!
//! This is the per-file step of the build: each source file becomes
//! `<name>.enc` carrying its original modification time, and directories are
//! mirrored unsealed.

use crate::config::BLOB_SUFFIX;
use crate::crypto::cipher::BlobCipher;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Append the blob suffix to a path.
fn blob_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BLOB_SUFFIX);
    PathBuf::from(name)
}

/// Seal `src` into `dest`, carrying over mtime and permission bits.
fn seal_to(src: &Path, dest: &Path, cipher: &BlobCipher) -> Result<()> {
    let metadata = fs::metadata(src)?;
    if metadata.is_dir() {
        return Err(Error::IsADirectory(src.display().to_string()));
    }

    let content = zeroize::Zeroizing::new(fs::read(src)?);
    let blob = cipher.seal(&content, metadata.modified()?)?;
    fs::write(dest, &blob)?;
    fs::set_permissions(dest, metadata.permissions())?;

    debug!("Sealed {} ({} bytes) -> {}", src.display(), content.len(), dest.display());
    Ok(())
}

/// Seal a single file next to itself as `<path>.enc`.
pub fn seal_file(path: &Path, cipher: &BlobCipher) -> Result<PathBuf> {
    let dest = blob_path(path);
    seal_to(path, &dest, cipher)?;
    Ok(dest)
}

/// Whether an entry is left out of a sealed tree.
///
/// Hidden and underscore-prefixed names are skipped like an embedded
/// directory would skip them, and existing blobs are never sealed twice.
fn is_excluded(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || name.starts_with('_')
        || (entry.file_type().is_file() && name.ends_with(BLOB_SUFFIX))
}

/// Mirror the tree under `src` into `out`, sealing every regular file.
///
/// Returns the paths of the blobs written, in traversal order.
pub fn seal_tree(src: &Path, out: &Path, cipher: &BlobCipher) -> Result<Vec<PathBuf>> {
    if !src.is_dir() {
        return Err(Error::NotADirectory(src.display().to_string()));
    }

    fs::create_dir_all(out)?;
    let mut written = Vec::new();

    for entry in WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e))
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::InvalidPath(e.to_string()))?;
        let target = out.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            let dest = blob_path(&target);
            seal_to(entry.path(), &dest, cipher)?;
            written.push(dest);
        }
    }

    info!("Sealed {} files from {} into {}", written.len(), src.display(), out.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    fn cipher() -> BlobCipher {
        BlobCipher::new(&[5u8; 32]).unwrap()
    }

    #[test]
    fn test_seal_file_keeps_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();
        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&path, mtime).unwrap();

        let blob = seal_file(&path, &cipher()).unwrap();
        assert_eq!(blob, dir.path().join("hello.txt.enc"));

        let (modified, plaintext) = cipher().open(&fs::read(&blob).unwrap()).unwrap();
        assert_eq!(plaintext.as_slice(), b"hello");
        assert_eq!(FileTime::from_system_time(modified), mtime);
    }

    #[test]
    fn test_seal_file_rejects_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            seal_file(dir.path(), &cipher()),
            Err(Error::IsADirectory(_))
        ));
    }

    #[test]
    fn test_seal_tree_mirrors_and_skips() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir(src.path().join("bin")).unwrap();
        fs::write(src.path().join("bin/tool"), b"tool").unwrap();
        fs::write(src.path().join("hello.txt"), b"hi").unwrap();
        fs::write(src.path().join(".hidden"), b"x").unwrap();
        fs::write(src.path().join("_draft"), b"x").unwrap();
        fs::write(src.path().join("old.enc"), b"x").unwrap();

        let written = seal_tree(src.path(), out.path(), &cipher()).unwrap();

        assert_eq!(
            written,
            vec![
                out.path().join("bin/tool.enc"),
                out.path().join("hello.txt.enc"),
            ]
        );
        assert!(out.path().join("bin").is_dir());
        assert!(!out.path().join(".hidden.enc").exists());
        assert!(!out.path().join("_draft.enc").exists());
        assert!(!out.path().join("old.enc.enc").exists());
    }
}

//! The encrypted file system - the main read interface.

use crate::config::BLOB_SUFFIX;
use crate::crypto::BlobCipher;
use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::vfs::handle::Handle;
use crate::vfs::path::{blob_name, VfsPath};
use crate::vfs::types::FileInfo;
use tracing::debug;

/// Read-only view of a store of sealed blobs under their plaintext names.
///
/// A file `hello.txt` is stored as the blob `hello.txt.enc`; directories are
/// stored as-is. Every open decrypts afresh and nothing is cached, so no
/// plaintext outlives the handle that holds it.
#[derive(Debug, Clone)]
pub struct EncryptedFs<S> {
    /// Backing store holding the blobs.
    store: S,
    /// Cipher built once from the key.
    cipher: BlobCipher,
}

impl<S: BlobStore> EncryptedFs<S> {
    /// Create a file system over `store` with the given key.
    ///
    /// The key is validated here; a bad length never reaches a read path.
    pub fn new(store: S, key: &[u8]) -> Result<Self> {
        Ok(Self::with_cipher(store, BlobCipher::new(key)?))
    }

    /// Create a file system with an existing cipher.
    pub fn with_cipher(store: S, cipher: BlobCipher) -> Self {
        Self { store, cipher }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open the blob behind a virtual file and decrypt it.
    fn open_blob(&self, path: &str) -> Result<Handle> {
        let blob_path = blob_name(path);
        let mut raw = self.store.open(&blob_path).map_err(|e| {
            if e.is_not_found() {
                Error::NotFound(path.to_string())
            } else {
                e
            }
        })?;
        if raw.is_dir() {
            raw.close();
            return Err(Error::NotFound(path.to_string()));
        }

        let blob = zeroize::Zeroizing::new(raw.read_remaining()?);
        let mode = raw.info().mode;
        raw.close();

        let (modified, plaintext) = self.cipher.open(&blob).map_err(|e| e.at_path(path))?;
        debug!("Decrypted {} ({} bytes)", path, plaintext.len());

        let name = VfsPath::parse(path)?.name().to_string();
        let info = FileInfo::file(name, plaintext.len() as u64, mode, modified);
        Ok(Handle::file(path, info, plaintext))
    }
}

impl<S: BlobStore> BlobStore for EncryptedFs<S> {
    /// Open a directory (exact match) or a sealed file (`path` + suffix).
    ///
    /// A blob that fails to decrypt is an error, never "not found".
    fn open(&self, path: &str) -> Result<Handle> {
        VfsPath::parse(path)?;

        match self.store.stat(path) {
            Ok(info) if info.is_dir => return Ok(Handle::directory(path, info)),
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.open_blob(path)
    }

    /// Virtual names of a directory's entries: directories as-is, blobs with
    /// the suffix stripped. Entries that are neither are not part of the
    /// sealed tree and are left out.
    fn names(&self, dir: &str) -> Result<Vec<String>> {
        let entries = self.store.read_dir(dir)?;
        let mut names = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.is_dir {
                names.push(entry.name);
            } else if let Some(name) = entry.name.strip_suffix(BLOB_SUFFIX) {
                names.push(name.to_string());
            } else {
                debug!("Ignoring unsealed entry {} in {}", entry.name, dir);
            }
        }

        Ok(names)
    }
}

//! Error types for sealed-embed.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sealed-embed operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while reading sealed blobs or syncing them to disk.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the backing store or the destination file system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither a directory nor a sealed blob exists at the path.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Byte read attempted on a directory handle.
    #[error("Is a directory: {0}")]
    IsADirectory(String),

    /// Invalid path format.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Handle cursor moved before the start of the file.
    #[error("Invalid offset in {0}")]
    InvalidOffset(String),

    /// Key does not match any supported AES key size.
    #[error("Invalid key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Decryption error (wrong key or corrupted blob).
    #[error("Decryption failed: wrong key or corrupted data")]
    Decryption,

    /// Blob is shorter than the fixed header plus tag.
    #[error("Blob truncated: {len} bytes, need at least {min}")]
    Truncated { len: usize, min: usize },

    /// Timestamp header carries a version this decoder does not know.
    #[error("Unsupported timestamp format version: {0}")]
    UnsupportedFormatVersion(u8),

    /// Size on disk after a sync write differs from the plaintext length.
    #[error("Write verification failed for {path}: expected {expected} bytes, was recorded {actual}")]
    WriteVerification {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation on one entry failed; wraps the cause with its virtual path.
    #[error("{path}: {source}")]
    Entry {
        path: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the virtual path of the entry that failed.
    pub fn at_path(self, path: &str) -> Self {
        Error::Entry {
            path: path.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through [`Error::Entry`] wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Entry { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the entry is simply absent, as opposed to present but unreadable.
    pub fn is_not_found(&self) -> bool {
        match self.root_cause() {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

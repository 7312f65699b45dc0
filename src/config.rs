//! Configuration constants and types for sealed-embed.

use serde::{Deserialize, Serialize};

/// Suffix appended to the name of every sealed file.
pub const BLOB_SUFFIX: &str = ".enc";

/// Nonce size for AES-GCM (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (128 bits).
pub const TAG_SIZE: usize = 16;

/// Serialized modification time: version + seconds + nanoseconds + zone offset.
pub const MODTIME_SIZE: usize = 1 + 8 + 4 + 2;

/// Current timestamp header version.
pub const TIME_FORMAT_VERSION: u8 = 1;

/// Fixed blob header: nonce followed by the timestamp.
pub const HEADER_SIZE: usize = NONCE_SIZE + MODTIME_SIZE;

/// Smallest possible blob (empty plaintext).
pub const MIN_BLOB_SIZE: usize = HEADER_SIZE + TAG_SIZE;

/// Key sizes accepted by the cipher (AES-128, AES-192, AES-256).
pub const KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Permission bits for files written by the sync engine.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Permission bits for directories created by the sync engine.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Permission bits reported for entries whose store carries none.
pub const FALLBACK_MODE: u32 = 0o444;

/// Options for materializing a sealed tree onto disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Mode for written files (unix only).
    pub file_mode: u32,

    /// Mode for created directories (unix only).
    pub dir_mode: u32,

    /// Stamp written files with the original modification time.
    pub preserve_mtime: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            file_mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
            preserve_mtime: true,
        }
    }
}

impl SyncConfig {
    /// Create a sync configuration with custom permission bits.
    pub fn new(file_mode: u32, dir_mode: u32) -> Self {
        Self {
            file_mode,
            dir_mode,
            preserve_mtime: true,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.file_mode > 0o7777 {
            return Err(format!("File mode {:o} has bits outside 7777", self.file_mode));
        }
        if self.dir_mode > 0o7777 {
            return Err(format!("Directory mode {:o} has bits outside 7777", self.dir_mode));
        }
        if self.dir_mode & 0o100 == 0 {
            return Err("Directory mode must keep the owner search bit".to_string());
        }
        Ok(())
    }
}

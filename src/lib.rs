//! Sealed Embed
//!
//! Read-only access to files shipped as per-file AES-GCM sealed blobs, with
//! transparent decrypt-on-open and incremental extraction to disk.
//!
//! # Features
//!
//! - **Virtual File System**: `<name>.enc` blobs appear under their original
//!   names, sizes and modification times
//! - **AES-GCM Encryption**: fresh random nonce per blob, fails closed on any
//!   tampering or wrong key
//! - **Tree Walking**: pre-order walk and globstar-style recursive listing
//! - **Extraction**: timestamp-incremental and keep-or-overwrite copies onto
//!   the real file system
//!
//! # Architecture
//!
//! ```text
//! Store (memory / directory) → EncryptedFs (decrypt on open) → Walk → Sync
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use sealed_embed::store::{BlobStore, DirStore};
//! use sealed_embed::vfs::EncryptedFs;
//! use std::path::Path;
//!
//! let key = [0u8; 32];
//! let fs = EncryptedFs::new(DirStore::new("./sealed").unwrap(), &key).unwrap();
//!
//! let data = fs.read_file("bin/gopher.png").unwrap();
//! println!("{} bytes", data.len());
//!
//! let outcome = sealed_embed::sync::xcopy(&fs, ".", Path::new("/tmp"), "copy");
//! print!("{}", outcome.report);
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod store;
pub mod sync;
pub mod vfs;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use store::BlobStore;
pub use vfs::EncryptedFs;

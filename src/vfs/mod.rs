//! Virtual file system over sealed blobs.
//!
//! Presents a store of `<name>.enc` blobs under their plaintext names, sizes
//! and modification times, decrypting on open.

mod handle;
mod operations;
mod path;
mod types;
mod walk;

pub use handle::Handle;
pub use operations::EncryptedFs;
pub use path::{base, blob_name, join, normalize, virtual_name, VfsPath};
pub use types::FileInfo;
pub use walk::{glob_star, walk_dir, WalkControl};

pub(crate) use walk::try_walk;

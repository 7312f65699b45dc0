//! Cryptographic operations for sealed-embed.
//!
//! This module provides:
//! - AES-GCM authenticated encryption of blobs
//! - The versioned modification-time header
//! - Sealing of plaintext files and trees into blobs

mod cipher;
mod seal;
mod timestamp;

pub use cipher::{open_with_key, seal_with_key, BlobCipher};
pub use seal::{seal_file, seal_tree};
pub use timestamp::{decode_mtime, encode_mtime};

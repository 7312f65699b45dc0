//! AES-GCM authenticated encryption of sealed blobs.
//!
//! The 15-byte modification-time header is authenticated as associated data,
//! so a flipped header bit fails like a flipped ciphertext bit. Blobs sealed
//! with empty associated data (header outside the tag) do not open here.

use crate::config::{HEADER_SIZE, KEY_SIZES, MIN_BLOB_SIZE, NONCE_SIZE};
use crate::crypto::timestamp::{decode_mtime, encode_mtime};
use crate::error::{Error, Result};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit, Nonce};
use rand::RngCore;
use std::fmt;
use std::time::SystemTime;
use zeroize::Zeroizing;

type Aes192Gcm = AesGcm<Aes192, U12>;

#[derive(Clone)]
enum Gcm {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM cipher for sealing and opening blobs.
///
/// The AES variant follows the key length: 16, 24 or 32 bytes.
#[derive(Clone)]
pub struct BlobCipher {
    gcm: Gcm,
}

impl BlobCipher {
    /// Create a cipher from raw key bytes.
    ///
    /// Fails with [`Error::InvalidKeyLength`] for any other key size.
    pub fn new(key: &[u8]) -> Result<Self> {
        if !KEY_SIZES.contains(&key.len()) {
            return Err(Error::InvalidKeyLength(key.len()));
        }

        let invalid = |_| Error::InvalidKeyLength(key.len());
        let gcm = match key.len() {
            16 => Gcm::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            24 => Gcm::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?),
            _ => Gcm::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
        };
        Ok(Self { gcm })
    }

    /// Key size in bytes.
    pub fn key_size(&self) -> usize {
        match self.gcm {
            Gcm::Aes128(_) => 16,
            Gcm::Aes192(_) => 24,
            Gcm::Aes256(_) => 32,
        }
    }

    /// Seal a plaintext together with its modification time.
    ///
    /// Returns: nonce (12 bytes) || mtime (15 bytes) || ciphertext || tag (16 bytes)
    pub fn seal(&self, plaintext: &[u8], modified: SystemTime) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let header = encode_mtime(modified);
        let payload = Payload {
            msg: plaintext,
            aad: &header,
        };

        let ciphertext = match &self.gcm {
            Gcm::Aes128(c) => c.encrypt(nonce, payload),
            Gcm::Aes192(c) => c.encrypt(nonce, payload),
            Gcm::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut result = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&header);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Open a blob produced by [`seal`](Self::seal).
    ///
    /// Any truncation, unknown header version, tampering or wrong key is an
    /// error; no plaintext is returned unless the tag verifies.
    pub fn open(&self, blob: &[u8]) -> Result<(SystemTime, Zeroizing<Vec<u8>>)> {
        if blob.len() < MIN_BLOB_SIZE {
            return Err(Error::Truncated {
                len: blob.len(),
                min: MIN_BLOB_SIZE,
            });
        }

        let (nonce_bytes, rest) = blob.split_at(NONCE_SIZE);
        let (header, ciphertext) = rest.split_at(HEADER_SIZE - NONCE_SIZE);
        let modified = decode_mtime(header)?;

        let nonce = Nonce::from_slice(nonce_bytes);
        let payload = Payload {
            msg: ciphertext,
            aad: header,
        };

        let plaintext = match &self.gcm {
            Gcm::Aes128(c) => c.decrypt(nonce, payload),
            Gcm::Aes192(c) => c.decrypt(nonce, payload),
            Gcm::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| Error::Decryption)?;

        Ok((modified, Zeroizing::new(plaintext)))
    }
}

impl fmt::Debug for BlobCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobCipher")
            .field("key_size", &self.key_size())
            .finish_non_exhaustive()
    }
}

/// Seal a plaintext with a raw key.
pub fn seal_with_key(plaintext: &[u8], modified: SystemTime, key: &[u8]) -> Result<Vec<u8>> {
    BlobCipher::new(key)?.seal(plaintext, modified)
}

/// Open a blob with a raw key.
pub fn open_with_key(blob: &[u8], key: &[u8]) -> Result<(SystemTime, Zeroizing<Vec<u8>>)> {
    BlobCipher::new(key)?.open(blob)
}

//! Open file handles over decrypted plaintext.

use crate::error::{Error, Result};
use crate::vfs::types::FileInfo;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use zeroize::Zeroizing;

/// A handle returned by `open`.
///
/// File handles own the decrypted plaintext and a read cursor; directory
/// handles carry only metadata. The plaintext is wiped when the handle is
/// closed or dropped. A handle is not meant to be shared: open one per
/// reader.
pub struct Handle {
    /// Path the handle was opened with.
    path: String,
    /// Metadata synthesized at open time.
    info: FileInfo,
    /// Plaintext, `None` for directories.
    data: Option<Zeroizing<Vec<u8>>>,
    /// Read cursor.
    offset: i64,
}

impl Handle {
    /// Create a directory handle.
    pub fn directory(path: impl Into<String>, info: FileInfo) -> Self {
        Self {
            path: path.into(),
            info,
            data: None,
            offset: 0,
        }
    }

    /// Create a file handle positioned at the start of `data`.
    pub fn file(path: impl Into<String>, info: FileInfo, data: Zeroizing<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            info,
            data: Some(data),
            offset: 0,
        }
    }

    /// Path the handle was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Metadata of the open entry.
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Whether the handle refers to a directory.
    pub fn is_dir(&self) -> bool {
        self.info.is_dir
    }

    /// Current cursor position.
    pub fn position(&self) -> i64 {
        self.offset
    }

    fn contents(&self) -> Result<&[u8]> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| Error::IsADirectory(self.path.clone()))?;
        if self.offset < 0 {
            return Err(Error::InvalidOffset(self.path.clone()));
        }
        Ok(data.as_slice())
    }

    /// Cursor as an index into `len` bytes; past the end (or past `usize`) is `len`.
    fn cursor(&self, len: usize) -> usize {
        usize::try_from(self.offset).map_or(len, |offset| offset.min(len))
    }

    /// Read everything from the cursor to the end.
    pub fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let data = self.contents()?;
        let len = data.len();
        let rest = data[self.cursor(len)..].to_vec();
        self.offset = len as i64;
        Ok(rest)
    }

    /// Close the handle, wiping the plaintext.
    pub fn close(mut self) {
        self.data = None;
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.contents().map_err(io::Error::other)?;
        let start = self.cursor(data.len());
        if start >= data.len() {
            return Ok(0);
        }

        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.offset += n as i64;
        Ok(n)
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.contents().map_err(io::Error::other)?.len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).ok(),
            SeekFrom::Current(d) => self.offset.checked_add(d),
            SeekFrom::End(d) => len.checked_add(d),
        };

        match target {
            Some(t) if t >= 0 => {
                self.offset = t;
                Ok(t as u64)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                Error::InvalidOffset(self.path.clone()),
            )),
        }
    }
}

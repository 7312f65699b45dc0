//! Fixed-width, versioned encoding of a file's modification time.
//!
//! Layout (15 bytes, big-endian):
//!
//! ```text
//! [0]      version (1)
//! [1..9)   seconds since 0001-01-01 00:00:00 UTC
//! [9..13)  nanoseconds
//! [13..15) zone offset in minutes, -1 for UTC
//! ```

use crate::config::{MODTIME_SIZE, TIME_FORMAT_VERSION};
use crate::error::{Error, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between 0001-01-01 and 1970-01-01.
const UNIX_TO_INTERNAL: i64 = 62_135_596_800;

/// Zone offset value meaning UTC.
const UTC_OFFSET: i16 = -1;

/// Encode a modification time into its header form.
pub fn encode_mtime(time: SystemTime) -> [u8; MODTIME_SIZE] {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (i64::try_from(d.as_secs()).unwrap_or(i64::MAX), d.subsec_nanos()),
        Err(e) => {
            let d = e.duration();
            let mut secs = -i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
            let mut nanos = d.subsec_nanos();
            if nanos > 0 {
                secs -= 1;
                nanos = 1_000_000_000 - nanos;
            }
            (secs, nanos)
        }
    };
    let internal = secs.saturating_add(UNIX_TO_INTERNAL);

    let mut out = [0u8; MODTIME_SIZE];
    out[0] = TIME_FORMAT_VERSION;
    out[1..9].copy_from_slice(&internal.to_be_bytes());
    out[9..13].copy_from_slice(&nanos.to_be_bytes());
    out[13..15].copy_from_slice(&UTC_OFFSET.to_be_bytes());
    out
}

/// Decode a header produced by [`encode_mtime`].
///
/// Unknown versions are rejected rather than guessed at.
pub fn decode_mtime(bytes: &[u8]) -> Result<SystemTime> {
    if bytes.len() < MODTIME_SIZE {
        return Err(Error::Truncated {
            len: bytes.len(),
            min: MODTIME_SIZE,
        });
    }
    if bytes[0] != TIME_FORMAT_VERSION {
        return Err(Error::UnsupportedFormatVersion(bytes[0]));
    }

    let mut sec_bytes = [0u8; 8];
    sec_bytes.copy_from_slice(&bytes[1..9]);
    let mut nsec_bytes = [0u8; 4];
    nsec_bytes.copy_from_slice(&bytes[9..13]);

    let internal = i64::from_be_bytes(sec_bytes);
    let nanos = u32::from_be_bytes(nsec_bytes);
    if nanos >= 1_000_000_000 {
        return Err(Error::Serialization(format!(
            "Timestamp nanoseconds out of range: {}",
            nanos
        )));
    }

    let unix = internal
        .checked_sub(UNIX_TO_INTERNAL)
        .ok_or_else(|| Error::Serialization("Timestamp out of range".to_string()))?;

    let time = if unix >= 0 {
        UNIX_EPOCH.checked_add(Duration::new(unix as u64, nanos))
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(unix.unsigned_abs()))
            .and_then(|t| t.checked_add(Duration::from_nanos(nanos as u64)))
    };

    time.ok_or_else(|| Error::Serialization("Timestamp out of range".to_string()))
}

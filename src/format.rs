//! HFile v1 Format
//!
//! Shared on-disk constants and primitives for the HFile v1 layout.
//! Everything in the file is big-endian.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Data Block 1..N                                             │
//! │   "DATABLK*" | [KeyLen: u32][ValLen: u32][Key][Value] ...   │
//! │   (Snappy files frame each block as                         │
//! │    [UncompressedLen: u32][CompressedLen: u32][payload])     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Data Index                                                  │
//! │   "IDXBLK)+" | [Offset: u64][Size: u32][KeyLen: uvarint]    │
//! │               [FirstKey] ...                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Trailer (60 bytes, version word included)                   │
//! │   "TRABLK\"$" | eight fixed fields | [Minor<<24|Major: u32] │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{HfileError, Result};

// =============================================================================
// Shared Constants (used by reader, writer, cursors)
// =============================================================================

/// Magic bytes opening the trailer
pub const TRAILER_MAGIC: &[u8; 8] = b"TRABLK\"$";

/// Magic bytes opening the data index
pub const INDEX_MAGIC: &[u8; 8] = b"IDXBLK)+";

/// Magic bytes opening every data block payload
pub const DATA_MAGIC: &[u8; 8] = b"DATABLK*";

/// Trailer size: magic (8) + eight fields (48) + version word (4)
pub const TRAILER_SIZE: usize = 60;

/// Only major version accepted
pub const MAJOR_VERSION: u32 = 1;

/// Only minor version accepted
pub const MINOR_VERSION: u32 = 0;

// =============================================================================
// Compression Codec
// =============================================================================

/// Compression codec recorded in the trailer
///
/// Any other code is a fatal open error; the check happens while parsing
/// the trailer, never lazily at block-load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Code 2: block payloads are stored raw
    None,
    /// Code 3: block payloads are Snappy-compressed with HBase framing
    Snappy,
}

impl Compression {
    /// The numeric code stored in the trailer
    pub fn code(self) -> u32 {
        match self {
            Compression::None => 2,
            Compression::Snappy => 3,
        }
    }

    /// Decode a trailer codec code
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            2 => Ok(Compression::None),
            3 => Ok(Compression::Snappy),
            other => Err(HfileError::BadFormat(format!(
                "unsupported compression codec {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Monotonic Probe Guard
// =============================================================================

/// Tracks the last key handed to a cursor and rejects regressions.
///
/// Scanners and iterators require non-decreasing probe keys; equal keys are
/// allowed. A rejected probe leaves the recorded key untouched, so cursor
/// state survives the error.
#[derive(Debug, Default)]
pub struct KeyOrder {
    last: Option<Vec<u8>>,
}

impl KeyOrder {
    /// Check a probe key against the previous one and record it
    pub fn check(&mut self, key: &[u8]) -> Result<()> {
        if let Some(last) = &self.last {
            if last.as_slice() > key {
                return Err(HfileError::OutOfOrderKey {
                    last: last.clone(),
                    requested: key.to_vec(),
                });
            }
        }
        self.last = Some(key.to_vec());
        Ok(())
    }

    /// Forget the recorded key; the cursor is fresh again
    pub fn reset(&mut self) {
        self.last = None;
    }
}

// =============================================================================
// Unsigned Varint
// =============================================================================

/// Decode an unsigned LEB128 varint at `*pos`, advancing it.
///
/// This is the encoding the index uses for first-key lengths.
pub fn read_uvarint(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *buf
            .get(*pos)
            .ok_or_else(|| HfileError::BadFormat("truncated uvarint".to_string()))?;
        *pos += 1;
        if shift >= 64 {
            return Err(HfileError::BadFormat("uvarint overflows u64".to_string()));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Append an unsigned LEB128 varint
pub fn write_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

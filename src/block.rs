//! Block Views
//!
//! A loaded data block is either a zero-copy slice of the mapping
//! (uncompressed files) or an owned buffer holding the Snappy decode.
//! Both start with the `DATABLK*` magic and then hold packed
//! `[KeyLen: u32][ValLen: u32][Key][Value]` entries.

use std::ops::{Deref, Range};

use crate::error::{HfileError, Result};

/// The payload bytes of one loaded data block.
pub(crate) enum BlockBytes<'a> {
    /// Borrowed slice of the mapping; no allocation happened.
    Mapped(&'a [u8]),
    /// Owned Snappy-decoded buffer, recyclable as decode scratch.
    Decoded(Vec<u8>),
}

impl BlockBytes<'_> {
    /// Recover the owned buffer for reuse when this block is discarded.
    ///
    /// Mapped blocks have nothing to recycle and yield an empty vector.
    pub(crate) fn into_scratch(self) -> Vec<u8> {
        match self {
            BlockBytes::Mapped(_) => Vec::new(),
            BlockBytes::Decoded(buf) => buf,
        }
    }
}

impl Deref for BlockBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            BlockBytes::Mapped(slice) => slice,
            BlockBytes::Decoded(buf) => buf,
        }
    }
}

/// Decode the entry starting at `pos`, returning the key range, the value
/// range, and the position just past the entry.
///
/// Callers guarantee `pos < block.len()`; an entry running past the end of
/// the block is structural corruption.
pub(crate) fn decode_entry(
    block: &[u8],
    pos: usize,
) -> Result<(Range<usize>, Range<usize>, usize)> {
    let header = block
        .get(pos..pos + 8)
        .ok_or_else(|| truncated(pos))?;
    let key_len = u32::from_be_bytes(header[0..4].try_into().unwrap()) as usize;
    let val_len = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;

    let key_start = pos + 8;
    let val_start = key_start + key_len;
    let end = val_start + val_len;
    if end > block.len() {
        return Err(truncated(pos));
    }

    Ok((key_start..val_start, val_start..end, end))
}

fn truncated(pos: usize) -> HfileError {
    HfileError::BadFormat(format!("entry at block offset {} extends past block end", pos))
}

//! Scanner
//!
//! Sorted point access over one hfile. A scanner answers a run of probes
//! whose keys never decrease, caching the currently loaded block (and its
//! scan position) across calls so consecutive probes into the same block
//! never re-read earlier entries.

use crate::block::{decode_entry, BlockBytes};
use crate::error::Result;
use crate::format::{KeyOrder, DATA_MAGIC};
use crate::reader::Reader;

/// Point-lookup cursor over a reader.
///
/// Exclusive: one thread at a time. Probe keys must be non-decreasing in
/// byte-lexicographic order; a violation is reported as
/// [`crate::HfileError::OutOfOrderKey`] and leaves the cursor untouched.
pub struct Scanner<'r> {
    reader: &'r Reader,
    /// Index of the cached block
    idx: usize,
    /// Cached block payload, if any
    block: Option<BlockBytes<'r>>,
    /// Scan position within the cached block
    pos: usize,
    order: KeyOrder,
    /// Recycled snappy decode buffer
    scratch: Vec<u8>,
}

impl<'r> Scanner<'r> {
    pub(crate) fn new(reader: &'r Reader, scratch: Vec<u8>) -> Self {
        Self {
            reader,
            idx: 0,
            block: None,
            pos: 0,
            order: KeyOrder::default(),
            scratch,
        }
    }

    /// Return the value of the first entry stored under `key`, or `None`
    /// when the file holds no such entry.
    pub fn get_first(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.load_block_for(key)? {
            tracing::debug!("no block for key {:02x?}", key);
            return Ok(None);
        }
        let mut values = self.collect_values(key, true)?;
        Ok(values.pop())
    }

    /// Return every value stored under `key`, in storage order.
    ///
    /// Equal keys are adjacent on disk, so the scan stops at the first key
    /// past the target; it does not cross into the following block.
    pub fn get_all(&mut self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        if !self.load_block_for(key)? {
            tracing::debug!("no block for key {:02x?}", key);
            return Ok(Vec::new());
        }
        self.collect_values(key, false)
    }

    /// Clear all cursor state; the scanner starts over from the first block
    pub fn reset(&mut self) {
        if let Some(block) = self.block.take() {
            self.scratch = block.into_scratch();
        }
        self.idx = 0;
        self.pos = 0;
        self.order.reset();
    }

    /// Reset and hand the decode buffer back to the reader's pool
    pub fn release(mut self) {
        self.reset();
        self.reader
            .scanner_buffers
            .offer(std::mem::take(&mut self.scratch));
    }

    /// Position the cursor on the block that may contain `key`.
    ///
    /// Returns `Ok(false)` when the key precedes the cached block's first
    /// key; for a fresh scanner that means it precedes the whole file.
    fn load_block_for(&mut self, key: &[u8]) -> Result<bool> {
        self.order.check(key)?;

        if self.reader.block_count() == 0 {
            return Ok(false);
        }
        if self.reader.block_first_key(self.idx) > key {
            return Ok(false);
        }

        let idx = self.reader.find_block(self.idx, key);
        if idx != self.idx || self.block.is_none() {
            tracing::debug!("loading block {} (was {})", idx, self.idx);
            let scratch = match self.block.take() {
                Some(block) => block.into_scratch(),
                None => std::mem::take(&mut self.scratch),
            };
            self.block = Some(self.reader.load_block(idx, scratch)?);
            self.idx = idx;
            self.pos = DATA_MAGIC.len();
        }
        Ok(true)
    }

    /// Scan forward from the current position collecting values for `key`.
    ///
    /// Entries are sorted within a block, so the scan ends at the first key
    /// greater than the target; the position is left at the start of that
    /// entry so the next (monotonic) probe resumes correctly.
    fn collect_values(&mut self, key: &[u8], first_only: bool) -> Result<Vec<Vec<u8>>> {
        let block = self.block.as_deref().expect("block loaded by load_block_for");
        let mut acc = Vec::new();

        while self.pos < block.len() {
            let (key_range, val_range, next) = decode_entry(block, self.pos)?;
            match block[key_range].cmp(key) {
                std::cmp::Ordering::Less => self.pos = next,
                std::cmp::Ordering::Equal => {
                    acc.push(block[val_range].to_vec());
                    self.pos = next;
                    if first_only {
                        break;
                    }
                }
                std::cmp::Ordering::Greater => break,
            }
        }

        Ok(acc)
    }
}

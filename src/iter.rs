//! Iterator
//!
//! Ordered traversal over one hfile's whole key space: step with `next`,
//! jump forward with a monotonic `seek`, and collect prefix-bounded
//! multi-value runs with `all_for_prefixes`.

use std::collections::HashMap;
use std::mem;
use std::ops::Range;

use crate::block::{decode_entry, BlockBytes};
use crate::error::Result;
use crate::format::{KeyOrder, DATA_MAGIC};
use crate::reader::Reader;

/// Traversal cursor over a reader.
///
/// Exclusive: one thread at a time. Seek keys must be non-decreasing.
/// [`key`](Iter::key) and [`value`](Iter::value) copy out of the current
/// block because any advance may replace the underlying buffer.
pub struct Iter<'r> {
    reader: &'r Reader,
    /// Index of the block the cursor is in
    block_idx: usize,
    /// Decoded payload of that block, if loaded
    block: Option<BlockBytes<'r>>,
    /// Position of the next entry within the block
    pos: usize,
    /// Key and value ranges of the current entry, into `block`
    current: Option<(Range<usize>, Range<usize>)>,
    order: KeyOrder,
    /// Recycled snappy decode buffer
    scratch: Vec<u8>,
}

impl<'r> Iter<'r> {
    pub(crate) fn new(reader: &'r Reader, scratch: Vec<u8>) -> Self {
        Self {
            reader,
            block_idx: 0,
            block: None,
            pos: 0,
            current: None,
            order: KeyOrder::default(),
            scratch,
        }
    }

    /// Advance to the next entry; `Ok(false)` once the file is exhausted
    pub fn next(&mut self) -> Result<bool> {
        self.current = None;

        loop {
            if self.block_idx >= self.reader.block_count() {
                return Ok(false);
            }

            if self.block.is_none() {
                let scratch = mem::take(&mut self.scratch);
                self.block = Some(self.reader.load_block(self.block_idx, scratch)?);
                self.pos = DATA_MAGIC.len();
            }

            let block = self.block.as_deref().expect("block just loaded");
            if self.pos >= block.len() {
                self.drop_block();
                self.block_idx += 1;
                continue;
            }

            let (key_range, val_range, next) = decode_entry(block, self.pos)?;
            self.pos = next;
            self.current = Some((key_range, val_range));
            return Ok(true);
        }
    }

    /// Move forward until the current key is `>= target`.
    ///
    /// Returns whether the cursor landed on an entry: `Ok(true)` leaves it
    /// on `target` itself when present, otherwise on the smallest stored
    /// key greater than it; `Ok(false)` means the file holds nothing at or
    /// past `target`. A cursor already at or past `target` does not move.
    pub fn seek(&mut self, target: &[u8]) -> Result<bool> {
        self.order.check(target)?;

        if let Some(key) = self.current_key() {
            if target <= key {
                tracing::debug!("seek already at or past {:02x?}", target);
                return Ok(true);
            }
        }
        if self.block_idx >= self.reader.block_count() {
            return Ok(false);
        }

        let block = self.reader.find_block(self.block_idx, target);
        if block != self.block_idx {
            tracing::debug!("seek jumping from block {} to {}", self.block_idx, block);
            self.drop_block();
            self.block_idx = block;
        }

        while self.next()? {
            if self.current_key().expect("entry after next") >= target {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Copy of the current entry's key, if the cursor is on one
    pub fn key(&self) -> Option<Vec<u8>> {
        self.current_key().map(<[u8]>::to_vec)
    }

    /// Copy of the current entry's value, if the cursor is on one
    pub fn value(&self) -> Option<Vec<u8>> {
        self.current_value().map(<[u8]>::to_vec)
    }

    /// Collect every entry whose key starts with one of `prefixes`,
    /// grouped by key, in storage order per key.
    ///
    /// `prefixes` must be sorted and non-overlapping, since the cursor only
    /// moves forward. A `resume_key` positions the cursor before the first
    /// prefix is visited, letting a caller continue a paginated
    /// enumeration; `limit` bounds the cumulative number of collected
    /// values across all prefixes.
    pub fn all_for_prefixes(
        &mut self,
        prefixes: &[Vec<u8>],
        limit: Option<usize>,
        resume_key: Option<&[u8]>,
    ) -> Result<HashMap<Vec<u8>, Vec<Vec<u8>>>> {
        let mut res: HashMap<Vec<u8>, Vec<Vec<u8>>> = HashMap::new();
        let mut collected = 0usize;

        if let Some(resume) = resume_key {
            self.seek(resume)?;
        }

        for prefix in prefixes {
            let mut on_entry = match resume_key {
                // The resume point is at or past this prefix: the cursor is
                // already positioned correctly.
                Some(resume) if resume >= prefix.as_slice() => self.current.is_some(),
                _ => self.seek(prefix)?,
            };

            let mut acc: Vec<Vec<u8>> = Vec::new();
            while on_entry && limit.map_or(true, |l| collected < l) {
                let key = match self.current_key() {
                    Some(key) if key.starts_with(prefix) => key.to_vec(),
                    _ => break,
                };
                acc.push(self.value().expect("entry has a value"));
                collected += 1;

                on_entry = self.next()?;
                let key_changed = match self.current_key() {
                    Some(next_key) => next_key != key.as_slice(),
                    None => true,
                };
                if key_changed {
                    res.insert(key, mem::take(&mut acc));
                }
            }
        }

        Ok(res)
    }

    /// Clear all cursor state; the iterator starts over from the first
    /// block
    pub fn reset(&mut self) {
        self.drop_block();
        self.block_idx = 0;
        self.pos = 0;
        self.current = None;
        self.order.reset();
    }

    /// Reset and hand the decode buffer back to the reader's pool
    pub fn release(mut self) {
        self.reset();
        self.reader
            .iterator_buffers
            .offer(mem::take(&mut self.scratch));
    }

    fn current_key(&self) -> Option<&[u8]> {
        let (key_range, _) = self.current.as_ref()?;
        Some(&self.block.as_deref()?[key_range.clone()])
    }

    fn current_value(&self) -> Option<&[u8]> {
        let (_, val_range) = self.current.as_ref()?;
        Some(&self.block.as_deref()?[val_range.clone()])
    }

    /// Unload the current block, keeping its buffer as decode scratch
    fn drop_block(&mut self) {
        if let Some(block) = self.block.take() {
            self.scratch = block.into_scratch();
        }
    }
}

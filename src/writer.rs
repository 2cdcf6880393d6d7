//! HFile Writer
//!
//! Produces conforming v1 files from pre-sorted key/value pairs. The
//! production system never writes hfiles (batch jobs do), so this writer
//! exists to build fixtures for tests and benchmarks, for both codecs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::format::{
    write_uvarint, Compression, DATA_MAGIC, INDEX_MAGIC, MAJOR_VERSION, MINOR_VERSION,
    TRAILER_MAGIC,
};

/// Streaming writer for one hfile.
///
/// Keys must arrive in non-decreasing order. Blocks are cut at
/// `block_size` bytes, except that a run of equal keys is never split
/// across blocks: readers rely on duplicates being adjacent within one
/// block.
pub struct Writer {
    writer: BufWriter<File>,
    compression: Compression,
    /// Cut a block once its payload reaches this many bytes
    block_size: usize,
    /// Payload of the block being built, starting with its magic
    block: Vec<u8>,
    /// First key of the block being built
    first_key: Option<Vec<u8>>,
    last_key: Option<Vec<u8>>,
    /// Finished blocks: offset, uncompressed payload size, first key
    index: Vec<(u64, u32, Vec<u8>)>,
    /// Current file offset
    offset: u64,
    entry_count: u32,
    total_uncompressed: u64,
}

impl Writer {
    /// Create an hfile at `path`, truncating anything already there
    pub fn create(path: &Path, compression: Compression, block_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            compression,
            block_size,
            block: Vec::new(),
            first_key: None,
            last_key: None,
            index: Vec::new(),
            offset: 0,
            entry_count: 0,
            total_uncompressed: 0,
        })
    }

    /// Append one entry; keys must be non-decreasing
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.last_key {
            if last.as_slice() > key {
                return Err(crate::HfileError::OutOfOrderKey {
                    last: last.clone(),
                    requested: key.to_vec(),
                });
            }
        }

        // Cut the block at the size threshold, but never between equal
        // keys: a duplicate run stays in one block.
        if !self.block.is_empty()
            && self.block.len() >= self.block_size
            && self.last_key.as_deref() != Some(key)
        {
            self.flush_block()?;
        }

        if self.block.is_empty() {
            self.block.extend_from_slice(DATA_MAGIC);
            self.first_key = Some(key.to_vec());
        }

        self.block.extend_from_slice(&(key.len() as u32).to_be_bytes());
        self.block.extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.block.extend_from_slice(key);
        self.block.extend_from_slice(value);

        self.last_key = Some(key.to_vec());
        self.entry_count += 1;
        Ok(())
    }

    /// Write the data index, the trailer and the version word, then flush.
    ///
    /// A writer that saw no entries still produces a valid (empty) file.
    pub fn finish(mut self) -> Result<()> {
        if !self.block.is_empty() {
            self.flush_block()?;
        }

        let data_index_offset = self.offset;
        let mut index_block = Vec::new();
        index_block.extend_from_slice(INDEX_MAGIC);
        for (offset, size, first_key) in &self.index {
            index_block.extend_from_slice(&offset.to_be_bytes());
            index_block.extend_from_slice(&size.to_be_bytes());
            write_uvarint(&mut index_block, first_key.len() as u64);
            index_block.extend_from_slice(first_key);
        }
        self.writer.write_all(&index_block)?;

        // Trailer: magic, eight fields, then the version word. No
        // file-info or meta-index sections are written, so the file-info
        // offset points at the data index and the meta offset is zero.
        self.writer.write_all(TRAILER_MAGIC)?;
        self.writer.write_all(&data_index_offset.to_be_bytes())?;
        self.writer.write_all(&data_index_offset.to_be_bytes())?;
        self.writer.write_all(&(self.index.len() as u32).to_be_bytes())?;
        self.writer.write_all(&0u64.to_be_bytes())?;
        self.writer.write_all(&0u32.to_be_bytes())?;
        self.writer.write_all(&self.total_uncompressed.to_be_bytes())?;
        self.writer.write_all(&self.entry_count.to_be_bytes())?;
        self.writer.write_all(&self.compression.code().to_be_bytes())?;
        let version_word = (MINOR_VERSION << 24) | MAJOR_VERSION;
        self.writer.write_all(&version_word.to_be_bytes())?;

        self.writer.flush()?;
        Ok(())
    }

    /// Emit the pending block and record it in the index
    fn flush_block(&mut self) -> Result<()> {
        let uncompressed_size = self.block.len() as u32;
        let first_key = self.first_key.take().expect("non-empty block has a first key");
        self.index.push((self.offset, uncompressed_size, first_key));
        self.total_uncompressed += u64::from(uncompressed_size);

        match self.compression {
            Compression::None => {
                self.writer.write_all(&self.block)?;
                self.offset += u64::from(uncompressed_size);
            }
            Compression::Snappy => {
                let compressed = snap::raw::Encoder::new().compress_vec(&self.block)?;
                self.writer.write_all(&uncompressed_size.to_be_bytes())?;
                self.writer.write_all(&(compressed.len() as u32).to_be_bytes())?;
                self.writer.write_all(&compressed)?;
                self.offset += 8 + compressed.len() as u64;
            }
        }

        self.block.clear();
        Ok(())
    }
}

//! HFile Reader
//!
//! Opens one hfile by memory-mapping it, parses the trailer and the data
//! index, and serves block loads to the cursors built on top.
//!
//! ## Responsibilities
//! - Validate the version word, trailer and index magics at open
//! - Hold the mapping and the block index for the reader's lifetime
//! - Locate the unique block that may contain a key (`find_block`)
//! - Materialize block payloads, decoding Snappy framing on demand
//! - Recycle cursor scratch buffers through bounded pools

use std::io;
use std::ops::Range;
use std::path::Path;

use crate::block::BlockBytes;
use crate::config::CollectionConfig;
use crate::error::{HfileError, Result};
use crate::format::{
    read_uvarint, Compression, DATA_MAGIC, INDEX_MAGIC, MAJOR_VERSION, MINOR_VERSION,
    TRAILER_MAGIC, TRAILER_SIZE,
};
use crate::iter::Iter;
use crate::mapping::Mapping;
use crate::pool::{BufferPool, POOL_CAPACITY};
use crate::scanner::Scanner;

/// The fixed trailer at the end of every hfile
pub(crate) struct Trailer {
    /// Kept for completeness; the file-info section is not consumed.
    #[allow(dead_code)]
    pub(crate) file_info_offset: u64,
    pub(crate) data_index_offset: u64,
    pub(crate) data_index_count: u32,
    pub(crate) meta_index_offset: u64,
    /// Kept for completeness; the meta index is not consumed.
    #[allow(dead_code)]
    pub(crate) meta_index_count: u32,
    pub(crate) total_uncompressed_data_bytes: u64,
    pub(crate) entry_count: u32,
    pub(crate) compression: Compression,
    /// Byte offset where the trailer region begins (`len - 60`)
    pub(crate) start: usize,
}

impl Trailer {
    /// Decode the trailer region `[len-60, len)`.
    ///
    /// The caller has already verified the file is at least `TRAILER_SIZE`
    /// bytes and that the version word (the region's last 4 bytes) is 1.0.
    fn parse(data: &[u8]) -> Result<Self> {
        let start = data.len() - TRAILER_SIZE;
        let region = &data[start..];
        if &region[..8] != TRAILER_MAGIC {
            return Err(HfileError::BadFormat("bad trailer magic".to_string()));
        }

        let mut pos = 8;
        let file_info_offset = read_u64(region, &mut pos);
        let data_index_offset = read_u64(region, &mut pos);
        let data_index_count = read_u32(region, &mut pos);
        let meta_index_offset = read_u64(region, &mut pos);
        let meta_index_count = read_u32(region, &mut pos);
        let total_uncompressed_data_bytes = read_u64(region, &mut pos);
        let entry_count = read_u32(region, &mut pos);
        let compression = Compression::from_code(read_u32(region, &mut pos))?;

        Ok(Self {
            file_info_offset,
            data_index_offset,
            data_index_count,
            meta_index_offset,
            meta_index_count,
            total_uncompressed_data_bytes,
            entry_count,
            compression,
            start,
        })
    }
}

/// One data-block descriptor from the index.
///
/// The first key is a range into the mapping, not a copy.
pub(crate) struct BlockMeta {
    pub(crate) offset: u64,
    pub(crate) size: u32,
    pub(crate) first_key: Range<usize>,
}

/// A read-only, memory-mapped hfile.
///
/// The reader is immutable after open and may be shared freely across
/// threads; all mutable state lives in the cursors it hands out.
pub struct Reader {
    config: CollectionConfig,
    mapping: Mapping,
    major_version: u32,
    minor_version: u32,
    pub(crate) trailer: Trailer,
    pub(crate) index: Vec<BlockMeta>,
    pub(crate) scanner_buffers: BufferPool,
    pub(crate) iterator_buffers: BufferPool,
}

impl Reader {
    /// Open the hfile described by `config`.
    ///
    /// Maps the file (pinning it in RAM when `in_mem` is set), checks the
    /// version word, and parses the trailer and the data index. Every
    /// structural violation fails the open with [`HfileError::BadFormat`].
    pub fn open(config: CollectionConfig) -> Result<Self> {
        let mapping = Mapping::open(&config.name, &config.path, config.in_mem)?;

        if mapping.len() < TRAILER_SIZE {
            return Err(HfileError::BadFormat(format!(
                "file too small for an hfile trailer: {} bytes",
                mapping.len()
            )));
        }

        let word = u32::from_be_bytes(mapping[mapping.len() - 4..].try_into().unwrap());
        let major_version = word & 0x00ff_ffff;
        let minor_version = word >> 24;
        if major_version != MAJOR_VERSION || minor_version != MINOR_VERSION {
            return Err(HfileError::BadFormat(format!(
                "unsupported hfile version {}.{}",
                major_version, minor_version
            )));
        }

        let trailer = Trailer::parse(&mapping)?;
        let index = parse_data_index(&mapping, &trailer)?;

        let reader = Self {
            config,
            mapping,
            major_version,
            minor_version,
            trailer,
            index,
            scanner_buffers: BufferPool::new(POOL_CAPACITY),
            iterator_buffers: BufferPool::new(POOL_CAPACITY),
        };

        tracing::info!(
            "opened hfile '{}': {} blocks, {} entries (codec {})",
            reader.config.name,
            reader.index.len(),
            reader.trailer.entry_count,
            reader.trailer.compression.code()
        );
        if reader.config.debug {
            let mut dump = Vec::new();
            let _ = reader.debug_info(&mut dump, 16);
            tracing::debug!("index of '{}':\n{}", reader.config.name, String::from_utf8_lossy(&dump));
        }

        Ok(reader)
    }

    /// Open a file directly, without residency or debug output
    pub fn open_path(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Self::open(CollectionConfig::new(name, path.as_ref()))
    }

    /// The collection name this reader was opened under
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Total number of key/value entries in the file
    pub fn entry_count(&self) -> u32 {
        self.trailer.entry_count
    }

    /// The codec every data block in this file uses
    pub fn compression(&self) -> Compression {
        self.trailer.compression
    }

    /// The file format version as `(major, minor)`
    pub fn version(&self) -> (u32, u32) {
        (self.major_version, self.minor_version)
    }

    /// Number of data blocks
    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    /// First key of the first block, or [`HfileError::Empty`] for a file
    /// with no data blocks
    pub fn first_key(&self) -> Result<&[u8]> {
        self.index
            .first()
            .map(|meta| &self.bytes()[meta.first_key.clone()])
            .ok_or_else(|| HfileError::Empty(self.config.name.clone()))
    }

    /// Write a human-readable summary: entry count, codec, block count and
    /// up to `include_start_keys` block first-keys in hex
    pub fn debug_info(&self, out: &mut dyn io::Write, include_start_keys: usize) -> io::Result<()> {
        writeln!(out, "entries: {}", self.trailer.entry_count)?;
        writeln!(
            out,
            "compressed: {} (codec: {})",
            self.trailer.compression != Compression::None,
            self.trailer.compression.code()
        )?;
        writeln!(out, "blocks: {}", self.index.len())?;
        for i in 0..self.index.len() {
            if i > include_start_keys {
                writeln!(out, "\t... and {} more", self.index.len() - i)?;
                return Ok(());
            }
            writeln!(out, "\t#{}: {}", i, hex(self.block_first_key(i)))?;
        }
        Ok(())
    }

    /// Build a scanner, reusing pooled scratch when available
    pub fn scanner(&self) -> Scanner<'_> {
        let scratch = self.scanner_buffers.take().unwrap_or_default();
        Scanner::new(self, scratch)
    }

    /// Build an iterator, reusing pooled scratch when available.
    ///
    /// Fresh iterators over Snappy files pre-size their decode buffer to
    /// 1.5x the mean uncompressed block, so the common case never grows it.
    pub fn iter(&self) -> Iter<'_> {
        let scratch = self
            .iterator_buffers
            .take()
            .unwrap_or_else(|| Vec::with_capacity(self.iter_scratch_capacity()));
        Iter::new(self, scratch)
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.mapping
    }

    /// First key of block `i`
    pub(crate) fn block_first_key(&self, i: usize) -> &[u8] {
        &self.bytes()[self.index[i].first_key.clone()]
    }

    /// Among blocks `[from, n)`, find the last whose first key is `<= key`.
    ///
    /// `from` lets forward-moving cursors skip everything behind them.
    /// Callers handle the `from == 0 && first_key(0) > key` case ("key
    /// precedes the whole file") themselves; here block 0 is still picked.
    pub(crate) fn find_block(&self, from: usize, key: &[u8]) -> usize {
        if from + 1 >= self.index.len() {
            // Already on the last block, so it is the only choice.
            return from;
        }

        if self.block_first_key(from + 1) > key {
            // The next block starts past the key; stay put.
            return from;
        }

        let ahead = self.index[from + 1..].partition_point(|meta| {
            &self.bytes()[meta.first_key.clone()] <= key
        });
        from + ahead
    }

    /// Materialize the payload of block `i`, starting at its `DATABLK*`
    /// magic.
    ///
    /// Codec none returns a zero-copy slice of the mapping and ignores
    /// `scratch`. Snappy validates the two framing words, decodes into
    /// `scratch` (growing it as needed) and returns it as an owned block.
    pub(crate) fn load_block(&self, i: usize, mut scratch: Vec<u8>) -> Result<BlockBytes<'_>> {
        let meta = &self.index[i];
        let offset = meta.offset as usize;

        let block = match self.trailer.compression {
            Compression::None => {
                let end = offset + meta.size as usize;
                let slice = self.bytes().get(offset..end).ok_or_else(|| {
                    HfileError::BadFormat(format!(
                        "block {} [{}, {}) lies outside the file",
                        i, offset, end
                    ))
                })?;
                BlockBytes::Mapped(slice)
            }
            Compression::Snappy => {
                let header = self.bytes().get(offset..offset + 8).ok_or_else(|| {
                    HfileError::BadFormat(format!("block {} framing lies outside the file", i))
                })?;
                let uncompressed = u32::from_be_bytes(header[0..4].try_into().unwrap());
                if uncompressed != meta.size {
                    return Err(HfileError::BadFormat(format!(
                        "block {}: framed uncompressed size {} != index size {}",
                        i, uncompressed, meta.size
                    )));
                }
                let compressed_len = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;
                let compressed = self
                    .bytes()
                    .get(offset + 8..offset + 8 + compressed_len)
                    .ok_or_else(|| {
                        HfileError::BadFormat(format!(
                            "block {} compressed bytes lie outside the file",
                            i
                        ))
                    })?;

                let need = snap::raw::decompress_len(compressed)?;
                scratch.resize(need, 0);
                let decoded = snap::raw::Decoder::new().decompress(compressed, &mut scratch)?;
                if decoded != uncompressed as usize {
                    // A short decode means the block was written as several
                    // independent snappy streams, which this engine does not
                    // read.
                    return Err(HfileError::BadFormat(format!(
                        "block {}: snappy decoded {} bytes, expected {} (sub-block framing unsupported)",
                        i, decoded, uncompressed
                    )));
                }
                scratch.truncate(decoded);
                BlockBytes::Decoded(scratch)
            }
        };

        let payload: &[u8] = &block;
        if payload.get(..8) != Some(DATA_MAGIC.as_slice()) {
            return Err(HfileError::BadFormat(format!(
                "bad data block magic in block {}",
                i
            )));
        }

        Ok(block)
    }

    fn iter_scratch_capacity(&self) -> usize {
        if self.trailer.compression == Compression::None || self.index.is_empty() {
            return 0;
        }
        let mean = self.trailer.total_uncompressed_data_bytes / self.index.len() as u64;
        (mean + mean / 2) as usize
    }
}

/// Parse the data index: verify its magic, then decode descriptors until
/// the region ends, checking the count against the trailer.
fn parse_data_index(data: &[u8], trailer: &Trailer) -> Result<Vec<BlockMeta>> {
    let start = trailer.data_index_offset as usize;
    let end = if trailer.meta_index_offset == 0 {
        trailer.start
    } else {
        trailer.meta_index_offset as usize
    };
    if start > end || end > data.len() {
        return Err(HfileError::BadFormat(format!(
            "data index [{}, {}) lies outside the file",
            start, end
        )));
    }

    let region = &data[start..end];
    if region.get(..8) != Some(INDEX_MAGIC.as_slice()) {
        return Err(HfileError::BadFormat("bad data index magic".to_string()));
    }

    let mut index = Vec::with_capacity(trailer.data_index_count as usize);
    let mut pos = 8;
    while pos < region.len() {
        let fixed = region.get(pos..pos + 12).ok_or_else(|| {
            HfileError::BadFormat("truncated data index descriptor".to_string())
        })?;
        let offset = u64::from_be_bytes(fixed[0..8].try_into().unwrap());
        let size = u32::from_be_bytes(fixed[8..12].try_into().unwrap());
        pos += 12;

        let key_len = read_uvarint(region, &mut pos)? as usize;
        let key_end = pos
            .checked_add(key_len)
            .filter(|&end| end <= region.len())
            .ok_or_else(|| {
                HfileError::BadFormat("data index first key extends past index end".to_string())
            })?;
        let first_key = start + pos..start + key_end;
        pos = key_end;

        index.push(BlockMeta {
            offset,
            size,
            first_key,
        });
    }

    if index.len() != trailer.data_index_count as usize {
        return Err(HfileError::BadFormat(format!(
            "data index holds {} descriptors, trailer declares {}",
            index.len(),
            trailer.data_index_count
        )));
    }

    Ok(index)
}

fn read_u64(buf: &[u8], pos: &mut usize) -> u64 {
    let value = u64::from_be_bytes(buf[*pos..*pos + 8].try_into().unwrap());
    *pos += 8;
    value
}

fn read_u32(buf: &[u8], pos: &mut usize) -> u32 {
    let value = u32::from_be_bytes(buf[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    value
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

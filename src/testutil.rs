//! Test Fixtures
//!
//! Generators for the reference fixture shared by the integration tests
//! and benchmarks: keys are 4-byte big-endian integers counting up from 1,
//! values are the ASCII string `"~"` followed by the key's decimal value.
//! The multi-value variant stores three values for every key where
//! `k % 1000 == 1`.

use std::path::Path;

use crate::error::Result;
use crate::format::Compression;
use crate::writer::Writer;

/// A fixture key: the integer as 4 big-endian bytes
pub fn key_int(i: u32) -> Vec<u8> {
    i.to_be_bytes().to_vec()
}

/// The fixture value stored under [`key_int`] `(i)`
pub fn value_int(i: u32) -> Vec<u8> {
    format!("~{}", i).into_bytes()
}

/// The `j`-th value of a multi-value fixture key
pub fn multi_value_int(i: u32, j: u32) -> Vec<u8> {
    format!("~{}.{}", i, j).into_bytes()
}

/// Write a fixture of `count` sequential single-value pairs starting at
/// key 1
pub fn write_fixture(
    path: &Path,
    count: u32,
    block_size: usize,
    compression: Compression,
) -> Result<()> {
    let mut writer = Writer::create(path, compression, block_size)?;
    for i in 1..=count {
        writer.write(&key_int(i), &value_int(i))?;
    }
    writer.finish()
}

/// Write a fixture of `count` sequential keys starting at key 1 where
/// every key with `k % 1000 == 1` carries three values
pub fn write_multi_fixture(
    path: &Path,
    count: u32,
    block_size: usize,
    compression: Compression,
) -> Result<()> {
    let mut writer = Writer::create(path, compression, block_size)?;
    for i in 1..=count {
        if i % 1000 == 1 {
            for j in 0..3 {
                writer.write(&key_int(i), &multi_value_int(i, j))?;
            }
        } else {
            writer.write(&key_int(i), &value_int(i))?;
        }
    }
    writer.finish()
}

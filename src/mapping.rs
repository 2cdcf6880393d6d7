//! File Mapping
//!
//! Read-only memory mapping of one hfile, held for the owning reader's
//! whole life. Collections marked in-memory get their pages pinned with
//! `mlock` so lookups never fault to disk.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;

/// A read-only mapping of an entire file.
///
/// Teardown order matters: pinned pages are unlocked before the map itself
/// is released, which `Drop` guarantees by unlocking in the wrapper and
/// leaving the unmap to the inner [`Mmap`].
pub struct Mapping {
    map: Mmap,
    locked: bool,
}

impl Mapping {
    /// Map `path` read-only, optionally pinning every page in RAM.
    ///
    /// A pin failure is fatal for the reader being opened: a collection
    /// configured as in-memory must not silently degrade to disk-backed.
    pub fn open(name: &str, path: &Path, pin: bool) -> Result<Self> {
        let file = File::open(path)?;
        // Safety: the file is opened read-only and the mapping is private;
        // writers mutating the file underneath us are outside the format's
        // trust model (files are immutable once published).
        let map = unsafe { Mmap::map(&file)? };

        let mut mapping = Self { map, locked: false };
        if pin {
            let mb = mapping.map.len() as f64 / (1024.0 * 1024.0);
            tracing::info!("locking '{}' into memory ({:.2}mb)...", name, mb);
            mapping.map.lock()?;
            mapping.locked = true;
            tracing::info!("locked '{}'", name);
        }
        Ok(mapping)
    }
}

impl Deref for Mapping {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        if self.locked {
            // Unlock before the inner map unmaps; an unlock failure at
            // teardown is not actionable.
            if let Err(e) = self.map.unlock() {
                tracing::warn!("failed to unlock mapping: {}", e);
            }
        }
    }
}

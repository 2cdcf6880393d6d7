//! Collection Set
//!
//! A named directory of open readers. A process typically serves several
//! collections, each backed by one hfile; the set opens them all up front
//! and hands out cursors by collection name.

use std::collections::HashMap;

use crate::config::CollectionConfig;
use crate::error::{HfileError, Result};
use crate::iter::Iter;
use crate::reader::Reader;
use crate::scanner::Scanner;

/// All configured collections, opened and ready to serve
pub struct CollectionSet {
    collections: HashMap<String, Reader>,
}

impl CollectionSet {
    /// Open a reader per config entry.
    ///
    /// An empty list is a configuration error. Later entries reusing a
    /// name silently replace earlier ones.
    pub fn load(configs: Vec<CollectionConfig>) -> Result<Self> {
        if configs.is_empty() {
            return Err(HfileError::Config("no collections to load".to_string()));
        }

        let mut collections = HashMap::new();
        for config in configs {
            let name = config.name.clone();
            let reader = Reader::open(config)?;
            collections.insert(name, reader);
        }

        Ok(Self { collections })
    }

    /// The reader serving `name`
    pub fn reader_for(&self, name: &str) -> Result<&Reader> {
        self.collections
            .get(name)
            .ok_or_else(|| HfileError::NotConfigured(name.to_string()))
    }

    /// A scanner over the collection `name`, scratch drawn from its pool
    pub fn scanner_for(&self, name: &str) -> Result<Scanner<'_>> {
        Ok(self.reader_for(name)?.scanner())
    }

    /// An iterator over the collection `name`, scratch drawn from its pool
    pub fn iterator_for(&self, name: &str) -> Result<Iter<'_>> {
        Ok(self.reader_for(name)?.iter())
    }

    /// Number of configured collections
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// True when no collections are configured (never after `load`)
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

//! Collection Configuration
//!
//! One `CollectionConfig` per hfile a process serves. Deployments describe
//! their collections as a JSON array of objects, e.g.
//!
//! ```json
//! [
//!   {"name": "users", "path": "/data/users.hfile", "in_mem": true},
//!   {"name": "events", "path": "/data/events.hfile"}
//! ]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HfileError, Result};

/// Configuration for a single collection
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    /// The name the collection is served under
    pub name: String,

    /// Path to the hfile itself
    pub path: PathBuf,

    /// Pin the whole file in RAM (via mlock) for the reader's lifetime
    #[serde(default)]
    pub in_mem: bool,

    /// Dump the block index when the reader opens
    #[serde(default)]
    pub debug: bool,
}

impl CollectionConfig {
    /// Create a config with residency and debug output off
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            in_mem: false,
            debug: false,
        }
    }
}

/// Load a JSON list of collection configs from `path`
pub fn load_collection_configs(path: &Path) -> Result<Vec<CollectionConfig>> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        HfileError::Config(format!("invalid collection config {}: {}", path.display(), e))
    })
}

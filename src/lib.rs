//! # hfile
//!
//! A read-only engine for the HBase HFile v1 format: sorted,
//! block-structured, immutable key/value files produced by batch jobs and
//! served at low latency as lookup tables. Files are memory-mapped
//! (optionally pinned in RAM), their trailer and block index parsed once
//! at open, and then queried through three access patterns:
//!
//! - point lookup of the first value for a key ([`Scanner::get_first`])
//! - every value for a key ([`Scanner::get_all`])
//! - ordered traversal with monotonic seek and prefix enumeration
//!   ([`Iter`])
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CollectionSet                           │
//! │               (name → Reader directory)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Reader                                │
//! │     mapping │ trailer │ block index │ buffer pools           │
//! └─────────┬───────────────────────────────────┬───────────────┘
//!           │                                   │
//!           ▼                                   ▼
//!    ┌─────────────┐                     ┌─────────────┐
//!    │   Scanner   │                     │    Iter     │
//!    │ (get_first, │                     │ (next, seek,│
//!    │  get_all)   │                     │  prefixes)  │
//!    └─────────────┘                     └─────────────┘
//! ```
//!
//! The reader is immutable after open and shared across threads; scanners
//! and iterators are exclusive per-thread cursors that enforce a
//! monotonic, non-decreasing probe-key contract.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collection;
pub mod config;
pub mod error;
pub mod format;
pub mod iter;
pub mod reader;
pub mod scanner;
pub mod testutil;
pub mod writer;

mod block;
mod mapping;
mod pool;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use collection::CollectionSet;
pub use config::{load_collection_configs, CollectionConfig};
pub use error::{HfileError, Result};
pub use format::Compression;
pub use iter::Iter;
pub use reader::Reader;
pub use scanner::Scanner;
pub use writer::Writer;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the hfile crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

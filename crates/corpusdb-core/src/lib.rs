//! CorpusDB core library
//!
//! This crate provides the caching subsystem shared by the CorpusDB client
//! SDK: pluggable key-value stores, domain-namespaced views over one shared
//! store, and tracking for the background refresh tasks behind the
//! stale-while-revalidate read path.

pub mod cache;
pub mod error;

// Re-export commonly used types
pub use cache::{Domain, DomainView, FileStore, KeyValueStore, MemoryStore, RefreshQueue, SharedStore};
pub use error::{CorpusError, CorpusResult};

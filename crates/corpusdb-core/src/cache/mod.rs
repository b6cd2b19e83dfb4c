//! Caching subsystem for the CorpusDB client
//!
//! One physical [`KeyValueStore`] is created per client session and shared by
//! every entity wrapper derived from it. [`DomainView`]s carve that store
//! into per-kind keyspaces ("project", "document", "chunk", "user") without
//! key collisions, and [`RefreshQueue`] keeps track of the fire-and-forget
//! refresh tasks behind the stale-while-revalidate read path.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: in-process map, lost on process exit
//! - [`FileStore`]: directory-backed, survives restarts, entries are
//!   string-serialized JSON files under a configurable name prefix

pub mod domain;
pub mod refresh;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{Domain, DomainView};
pub use refresh::RefreshQueue;
pub use store::{DEFAULT_KEY_PREFIX, FileStore, KeyValueStore, MemoryStore, SharedStore};

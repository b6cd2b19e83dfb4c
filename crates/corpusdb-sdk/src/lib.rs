//! CorpusDB client SDK
//!
//! High-level client for a CorpusDB document/project/chat backend. Every
//! entity wrapper derived from one [`CorpusClient`] shares a single session
//! cache store, and repeated child listings are served stale-while-revalidate:
//! previously cached data is returned immediately while a background refresh
//! updates the cache for the next call.
//!
//! # Example
//!
//! ```no_run
//! use corpusdb_sdk::CorpusClient;
//!
//! # async fn example() -> Result<(), corpusdb_sdk::CorpusError> {
//! let client = CorpusClient::new("https://corpusdb.example.org")?;
//! client.login("alice", "secret").await?;
//!
//! for project in client.projects().await? {
//!     let documents = project.documents().await?;
//!     println!("{}: {} documents", project.name(), documents.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Persistent cache
//!
//! The cache backend is pluggable; a [`FileStore`] makes cached entities
//! survive process restarts:
//!
//! ```no_run
//! use corpusdb_sdk::{CorpusClient, FileStore};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), corpusdb_sdk::CorpusError> {
//! let store = Arc::new(FileStore::new("/var/cache/corpusdb")?);
//! let client = CorpusClient::with_store("https://corpusdb.example.org", store)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod document;
pub mod project;
pub mod transport;
pub mod types;

pub use client::{ChatOptions, CorpusClient};
pub use document::Document;
pub use project::Project;
pub use transport::{HttpTransport, Transport};
pub use types::{
    ChatResponse, ConversationMessage, EntityId, RawChunk, RawDocument, RawProject, SearchContent,
    SearchResult, TokenData, User,
};

// Re-export the cache subsystem so applications can supply their own stores
pub use corpusdb_core::cache::{
    Domain, DomainView, FileStore, KeyValueStore, MemoryStore, RefreshQueue, SharedStore,
};
pub use corpusdb_core::error::{CorpusError, CorpusResult};

//! Domain-scoped views over a shared store

use crate::cache::store::SharedStore;
use crate::error::{CorpusError, CorpusResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Separator between the domain tag and the logical key.
const KEY_SEPARATOR: char = ':';

/// The logical caches sharing one physical store. Tags are fixed and
/// disjoint, so namespaced keys from different domains never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Project,
    Document,
    Chunk,
    User,
}

impl Domain {
    /// The fixed key prefix for this domain
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Document => "document",
            Self::Chunk => "chunk",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed projection of a shared store scoped to one [`Domain`].
///
/// A view owns no storage: it is a `(store, domain)` pair that prefixes
/// every logical key with the domain tag before delegating. Any two views
/// over the same store and domain are interchangeable and observe each
/// other's writes.
pub struct DomainView<T> {
    store: SharedStore,
    domain: Domain,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DomainView<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            domain: self.domain,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for DomainView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainView")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl<T> DomainView<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a view over `store` scoped to `domain`.
    pub fn new(store: SharedStore, domain: Domain) -> Self {
        Self {
            store,
            domain,
            _marker: PhantomData,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// The shared store this view projects.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}{}", self.domain.tag(), KEY_SEPARATOR, key)
    }

    /// Look up and decode the value at `key`. Absent keys are `Ok(None)`;
    /// a value that cannot be decoded as `T` is a hard error.
    pub fn get(&self, key: &str) -> CorpusResult<Option<T>> {
        let namespaced = self.namespaced(key);
        let Some(value) = self.store.get(&namespaced)? else {
            return Ok(None);
        };
        let decoded = serde_json::from_value(value)
            .map_err(|e| CorpusError::decode(namespaced, e.to_string()))?;
        Ok(Some(decoded))
    }

    /// Upsert the value at `key`.
    pub fn set(&self, key: &str, value: &T) -> CorpusResult<()> {
        let encoded = serde_json::to_value(value)?;
        self.store.set(&self.namespaced(key), encoded)
    }

    /// Defined as a non-absent [`get`](Self::get), so it pays the same
    /// decode cost and surfaces the same decode errors.
    pub fn has(&self, key: &str) -> CorpusResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remove the value at `key`. No-op if absent.
    pub fn delete(&self, key: &str) -> CorpusResult<()> {
        self.store.delete(&self.namespaced(key))
    }

    /// Every value stored under this view's domain tag.
    ///
    /// Membership is decided by the key prefix alone, never by inspecting
    /// value shape, so the result is exact for any `T`.
    pub fn values(&self) -> CorpusResult<Vec<T>> {
        let prefix = format!("{}{}", self.domain.tag(), KEY_SEPARATOR);
        let mut out = Vec::new();
        for key in self.store.keys() {
            if let Some(logical) = key.strip_prefix(&prefix) {
                if let Some(value) = self.get(logical)? {
                    out.push(value);
                }
            }
        }
        Ok(out)
    }
}

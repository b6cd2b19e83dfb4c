//! Cache store implementations

use crate::error::{CorpusError, CorpusResult};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default file name prefix for [`FileStore`] entries, so one directory can
/// host unrelated data alongside the cache.
pub const DEFAULT_KEY_PREFIX: &str = "corpusdb_";

/// Minimal synchronous key-value contract shared by all cache backends.
///
/// Keys are already namespaced (`"<domain>:<logical>"`) by the time they
/// reach a store; values are arbitrary JSON. Operations never suspend, so
/// the entity layer can answer Warm reads without touching the runtime.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Look up a value. Unknown keys are `Ok(None)`, never an error.
    /// Persisted data that cannot be decoded is a hard error.
    fn get(&self, key: &str) -> CorpusResult<Option<Value>>;

    /// Upsert a value. The last write for a key wins.
    fn set(&self, key: &str, value: Value) -> CorpusResult<()>;

    /// True iff the most recent `set` for the key was not followed by a
    /// `delete` or `clear`.
    fn has(&self, key: &str) -> bool;

    /// Remove a key. No-op if absent.
    fn delete(&self, key: &str) -> CorpusResult<()>;

    /// Snapshot of every namespaced key currently stored. Backs exact
    /// domain-scoped iteration without ever inspecting value shape.
    fn keys(&self) -> Vec<String>;

    /// Lazy one-shot snapshot of every stored value across all domains.
    /// Not required to reflect mutations made during iteration; restartable
    /// by calling again.
    fn values(&self) -> Box<dyn Iterator<Item = CorpusResult<Value>> + Send + '_>;

    /// Empty the store. Optional capability: backends without a bulk
    /// primitive sweep their own key prefix instead of truncating the
    /// underlying medium.
    fn clear(&self) -> CorpusResult<()> {
        Err(CorpusError::cache("clear is not supported by this store"))
    }
}

/// Shared handle to the session store, threaded through every domain view
/// and entity wrapper. Wrappers never construct their own private store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Ephemeral in-process store. Values are retained in memory form without
/// serialization and are lost on process exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all domains
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CorpusResult<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> CorpusResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn delete(&self, key: &str) -> CorpusResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn values(&self) -> Box<dyn Iterator<Item = CorpusResult<Value>> + Send + '_> {
        let snapshot: Vec<Value> = self.entries.read().values().cloned().collect();
        Box::new(snapshot.into_iter().map(Ok))
    }

    fn clear(&self) -> CorpusResult<()> {
        self.entries.write().clear();
        Ok(())
    }
}

/// Durable store backed by a directory of JSON files.
///
/// Each entry lives at `<dir>/<prefix><encoded key>.json`, where the
/// encoding keeps namespaced keys filesystem-safe and reversible. An
/// in-memory index is rebuilt by scanning the directory on construction, so
/// entries written by a previous process are visible immediately. `clear`
/// removes only files carrying this store's prefix; unrelated files sharing
/// the directory are untouched.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    prefix: String,
    index: Mutex<BTreeMap<String, PathBuf>>,
}

impl FileStore {
    /// Open (or create) a store at `dir` with the default key prefix.
    pub fn new(dir: impl AsRef<Path>) -> CorpusResult<Self> {
        Self::with_prefix(dir, DEFAULT_KEY_PREFIX)
    }

    /// Open (or create) a store at `dir` with a custom key prefix.
    pub fn with_prefix(dir: impl AsRef<Path>, prefix: impl Into<String>) -> CorpusResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let prefix = prefix.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                CorpusError::cache(format!("failed to create store directory: {}", e))
            })?;
        }

        let index = Self::scan(&dir, &prefix)?;
        debug!(
            dir = %dir.display(),
            prefix = %prefix,
            entries = index.len(),
            "indexed file store"
        );

        Ok(Self {
            dir,
            prefix,
            index: Mutex::new(index),
        })
    }

    /// The key prefix distinguishing this store's files from unrelated data.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn scan(dir: &Path, prefix: &str) -> CorpusResult<BTreeMap<String, PathBuf>> {
        let mut index = BTreeMap::new();
        let entries = fs::read_dir(dir)
            .map_err(|e| CorpusError::cache(format!("failed to read store directory: {}", e)))?;

        for entry in entries {
            let entry = entry
                .map_err(|e| CorpusError::cache(format!("failed to read directory entry: {}", e)))?;
            let file_type = entry
                .file_type()
                .map_err(|e| CorpusError::cache(format!("failed to get file type: {}", e)))?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(stem) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                index.insert(key, entry.path());
            }
        }

        Ok(index)
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", self.prefix, encode_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CorpusResult<Option<Value>> {
        let path = {
            let index = self.index.lock();
            match index.get(key) {
                Some(path) => path.clone(),
                None => return Ok(None),
            }
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // removed out-of-band; equivalent to a deleted key
                self.index.lock().remove(key);
                return Ok(None);
            }
            Err(e) => {
                return Err(CorpusError::cache(format!(
                    "failed to read cache file for '{}': {}",
                    key, e
                )));
            }
        };

        let value = serde_json::from_str(&content)
            .map_err(|e| CorpusError::decode(key, e.to_string()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: Value) -> CorpusResult<()> {
        let path = self.file_path(key);
        let content = serde_json::to_string(&value)?;
        fs::write(&path, content).map_err(|e| {
            CorpusError::cache(format!("failed to write cache file for '{}': {}", key, e))
        })?;
        self.index.lock().insert(key.to_string(), path);
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.index.lock().contains_key(key)
    }

    fn delete(&self, key: &str) -> CorpusResult<()> {
        let Some(path) = self.index.lock().remove(key) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CorpusError::cache(format!(
                "failed to remove cache file for '{}': {}",
                key, e
            ))),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.index.lock().keys().cloned().collect()
    }

    fn values(&self) -> Box<dyn Iterator<Item = CorpusResult<Value>> + Send + '_> {
        let snapshot: Vec<(String, PathBuf)> = self
            .index
            .lock()
            .iter()
            .map(|(key, path)| (key.clone(), path.clone()))
            .collect();

        Box::new(snapshot.into_iter().filter_map(|(key, path)| {
            match fs::read_to_string(&path) {
                Ok(content) => Some(
                    serde_json::from_str(&content)
                        .map_err(|e| CorpusError::decode(&key, e.to_string())),
                ),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => Some(Err(CorpusError::cache(format!(
                    "failed to read cache file for '{}': {}",
                    key, e
                )))),
            }
        }))
    }

    /// Best-effort sweep over this store's key prefix rather than a full
    /// truncation of the directory.
    fn clear(&self) -> CorpusResult<()> {
        let mut index = self.index.lock();
        while let Some((key, path)) = index.pop_first() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    index.insert(key.clone(), path);
                    return Err(CorpusError::cache(format!(
                        "failed to remove cache file for '{}': {}",
                        key, e
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Encode a namespaced key into a reversible filesystem-safe form.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod key_encoding_tests {
    use super::*;

    #[test]
    fn encode_round_trips_namespaced_keys() {
        for key in ["document:42", "chunk:7", "user:alice@example.org", "a b/c"] {
            let encoded = encode_key(key);
            assert!(!encoded.contains(':'));
            assert!(!encoded.contains('/'));
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
    }

    #[test]
    fn decode_rejects_truncated_escapes() {
        assert_eq!(decode_key("abc%4"), None);
        assert_eq!(decode_key("abc%zz"), None);
    }
}

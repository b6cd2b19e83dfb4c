//! Shared test transport
#![allow(dead_code)]

use async_trait::async_trait;
use corpusdb_sdk::{CorpusClient, CorpusError, CorpusResult, MemoryStore, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory transport serving canned JSON per path and counting fetches.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Value>>,
    hits: Mutex<HashMap<String, usize>>,
    auth_rejected: Mutex<HashSet<String>>,
    last_bearer: Mutex<HashMap<String, Option<String>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: &str, value: Value) {
        self.routes.lock().insert(path.to_string(), value);
    }

    pub fn unroute(&self, path: &str) {
        self.routes.lock().remove(path);
    }

    /// Make this path answer 401 regardless of any route.
    pub fn reject_auth(&self, path: &str) {
        self.auth_rejected.lock().insert(path.to_string());
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().get(path).copied().unwrap_or(0)
    }

    pub fn last_bearer(&self, path: &str) -> Option<String> {
        self.last_bearer.lock().get(path).cloned().flatten()
    }

    fn respond(&self, path: &str, bearer: Option<&str>) -> CorpusResult<Value> {
        *self.hits.lock().entry(path.to_string()).or_insert(0) += 1;
        self.last_bearer
            .lock()
            .insert(path.to_string(), bearer.map(str::to_string));

        if self.auth_rejected.lock().contains(path) {
            return Err(CorpusError::auth(format!("request to {path} was rejected")));
        }
        self.routes
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| CorpusError::not_found(path))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, path: &str, bearer: Option<&str>) -> CorpusResult<Value> {
        self.respond(path, bearer)
    }

    async fn post_json(
        &self,
        path: &str,
        _body: &Value,
        bearer: Option<&str>,
    ) -> CorpusResult<Value> {
        self.respond(path, bearer)
    }

    async fn post_form(
        &self,
        path: &str,
        _fields: &[(String, String)],
        bearer: Option<&str>,
    ) -> CorpusResult<Value> {
        self.respond(path, bearer)
    }
}

pub fn client_with(transport: Arc<FakeTransport>) -> CorpusClient {
    CorpusClient::with_transport(transport, Arc::new(MemoryStore::new()))
}

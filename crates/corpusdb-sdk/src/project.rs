//! Project entity wrapper

use crate::client::CorpusClient;
use crate::document::Document;
use crate::types::{EntityId, RawDocument, RawProject};
use corpusdb_core::cache::DomainView;
use corpusdb_core::error::CorpusResult;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A project owning documents.
///
/// Child listings follow a stale-while-revalidate policy: the first
/// successful [`documents`](Self::documents) call fetches from the backend
/// and seeds the shared document cache; later calls on the same wrapper
/// resolve the recorded id list against the cache and return immediately,
/// while a background refresh updates both for the call after.
#[derive(Clone)]
pub struct Project {
    data: RawProject,
    client: CorpusClient,
    documents: DomainView<RawDocument>,
    /// Ordered ids from the last successful fetch; `None` until then (Cold).
    /// Replaced wholesale by each refresh, never edited in place.
    document_ids: Arc<Mutex<Option<Vec<String>>>>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("id", &self.data.id)
            .field("name", &self.data.name)
            .finish_non_exhaustive()
    }
}

impl Project {
    pub(crate) fn new(data: RawProject, client: CorpusClient) -> Self {
        let documents = client.document_view();
        Self {
            data,
            client,
            documents,
            document_ids: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> EntityId {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    /// The raw backend record
    pub fn raw(&self) -> &RawProject {
        &self.data
    }

    async fn fetch_documents(client: &CorpusClient, id: EntityId) -> CorpusResult<Vec<RawDocument>> {
        client
            .get(&format!("/vector/projects/{}/documents", id))
            .await
    }

    /// List this project's documents, stale-while-revalidate.
    ///
    /// Cold (never listed): awaits the fetch, caches every document and
    /// records the server ordering. Warm: resolves the recorded ids against
    /// the shared cache and returns without network latency; ids that no
    /// longer resolve are dropped silently, and a fire-and-forget refresh
    /// replaces the cache entries and the id list for the next call.
    pub async fn documents(&self) -> CorpusResult<Vec<Document>> {
        let recorded = self.document_ids.lock().clone();
        if let Some(ids) = recorded {
            let mut docs = Vec::with_capacity(ids.len());
            for id in &ids {
                if let Some(raw) = self.documents.get(id)? {
                    docs.push(Document::new(raw, self.client.clone()));
                }
            }
            self.spawn_refresh();
            return Ok(docs);
        }

        let fresh = Self::fetch_documents(&self.client, self.data.id).await?;
        let mut ids = Vec::with_capacity(fresh.len());
        for raw in &fresh {
            let key = raw.id.to_string();
            self.documents.set(&key, raw)?;
            ids.push(key);
        }
        *self.document_ids.lock() = Some(ids);

        Ok(fresh
            .into_iter()
            .map(|raw| Document::new(raw, self.client.clone()))
            .collect())
    }

    fn spawn_refresh(&self) {
        let client = self.client.clone();
        let view = self.documents.clone();
        let recorded = Arc::clone(&self.document_ids);
        let project_id = self.data.id;

        self.client.refreshes().spawn(async move {
            let fresh = match Self::fetch_documents(&client, project_id).await {
                Ok(fresh) => fresh,
                Err(err) => {
                    // best-effort refresh; the caller already has its answer
                    debug!(project_id, error = %err, "background document refresh failed");
                    return;
                }
            };

            // cache entries are written before the id list is replaced, so a
            // concurrent Warm read never sees a recorded id without a value
            let mut ids = Vec::with_capacity(fresh.len());
            for raw in &fresh {
                let key = raw.id.to_string();
                if let Err(err) = view.set(&key, raw) {
                    warn!(project_id, error = %err, "aborting document refresh");
                    return;
                }
                ids.push(key);
            }
            *recorded.lock() = Some(ids);
        });
    }
}

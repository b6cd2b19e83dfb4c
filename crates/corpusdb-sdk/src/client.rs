//! CorpusDB client
//!
//! [`CorpusClient`] owns the session: the transport, the bearer token, the
//! shared cache store and the background refresh queue. Entity wrappers are
//! only ever constructed through it, which is what guarantees that every
//! wrapper sees the same physical cache.

use crate::document::Document;
use crate::project::Project;
use crate::transport::{HttpTransport, Transport, percent_encode};
use crate::types::{
    ChatRequest, ChatResponse, ConversationMessage, DocumentByTitleEnvelope, DocumentsEnvelope,
    EntityId, RawChunk, RawDocument, RawProject, SearchResult, TokenData, User,
};
use corpusdb_core::cache::{Domain, DomainView, MemoryStore, RefreshQueue, SharedStore};
use corpusdb_core::error::{CorpusError, CorpusResult};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Options for [`CorpusClient::chat`].
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Restrict retrieval to one project
    pub project: Option<EntityId>,
    /// Document ids to include
    pub include: Vec<String>,
    /// Document ids to exclude
    pub exclude: Vec<String>,
    /// Prior turns of the conversation
    pub conversation: Vec<ConversationMessage>,
}

/// Handle to a CorpusDB backend session.
///
/// Cloning is cheap; clones share the transport, the bearer token, the
/// session cache store and the background refresh queue.
#[derive(Clone)]
pub struct CorpusClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    store: SharedStore,
    refreshes: RefreshQueue,
    token: Mutex<Option<String>>,
}

impl fmt::Debug for CorpusClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorpusClient")
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}

impl CorpusClient {
    /// Connect to a backend with an ephemeral in-process cache.
    pub fn new(base_url: &str) -> CorpusResult<Self> {
        Self::with_store(base_url, Arc::new(MemoryStore::new()))
    }

    /// Connect with a caller-provided store, e.g. a persistent
    /// [`FileStore`](corpusdb_core::cache::FileStore).
    pub fn with_store(base_url: &str, store: SharedStore) -> CorpusResult<Self> {
        Ok(Self::with_transport(
            Arc::new(HttpTransport::new(base_url)?),
            store,
        ))
    }

    /// Build a client over a custom transport. The entity and cache layers
    /// only ever talk to the backend through [`Transport`].
    pub fn with_transport(transport: Arc<dyn Transport>, store: SharedStore) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                store,
                refreshes: RefreshQueue::new(),
                token: Mutex::new(None),
            }),
        }
    }

    /// The session store shared by every entity wrapper derived from this
    /// client.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.inner.store)
    }

    /// Background refreshes spawned by Warm listings. A test harness can
    /// `refreshes().drain().await` before asserting on cache state.
    pub fn refreshes(&self) -> RefreshQueue {
        self.inner.refreshes.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.token.lock().is_some()
    }

    fn bearer(&self) -> Option<String> {
        self.inner.token.lock().clone()
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> CorpusResult<T> {
        let token = self.bearer();
        let value = match self.inner.transport.get_json(path, token.as_deref()).await {
            Ok(value) => value,
            Err(err) => return Err(self.on_request_error(err)),
        };
        serde_json::from_value(value)
            .map_err(|e| CorpusError::Json(format!("unexpected payload from {}: {}", path, e)))
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> CorpusResult<T> {
        let token = self.bearer();
        let value = match self
            .inner
            .transport
            .post_json(path, body, token.as_deref())
            .await
        {
            Ok(value) => value,
            Err(err) => return Err(self.on_request_error(err)),
        };
        serde_json::from_value(value)
            .map_err(|e| CorpusError::Json(format!("unexpected payload from {}: {}", path, e)))
    }

    /// A rejected bearer token is stale; drop it so the next login starts
    /// clean.
    fn on_request_error(&self, err: CorpusError) -> CorpusError {
        if matches!(err, CorpusError::Auth(_)) {
            self.inner.token.lock().take();
        }
        err
    }

    /// Authenticate with the OAuth password grant and store the bearer
    /// token for subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> CorpusResult<()> {
        let fields = [
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
            ("client_id".to_string(), "frontend".to_string()),
            ("client_secret".to_string(), String::new()),
            ("scope".to_string(), String::new()),
        ];
        let value = self.inner.transport.post_form("/token", &fields, None).await?;
        let token: TokenData = serde_json::from_value(value)
            .map_err(|e| CorpusError::auth(format!("unexpected token payload: {}", e)))?;
        if token.access_token.is_empty() {
            return Err(CorpusError::auth("no access token in response"));
        }
        *self.inner.token.lock() = Some(token.access_token);
        debug!("login successful, token stored");
        Ok(())
    }

    /// End the session: forget the bearer token and empty the cache store.
    /// Clearing is best effort since not every backend supports it.
    pub fn logout(&self) {
        if let Err(err) = self.inner.store.clear() {
            debug!(error = %err, "cache store does not support clear");
        }
        self.inner.token.lock().take();
        debug!("logged out, token cleared");
    }

    /// The user the current token belongs to.
    pub async fn current_user(&self) -> CorpusResult<User> {
        self.get("/users/me").await
    }

    pub(crate) fn project_view(&self) -> DomainView<RawProject> {
        DomainView::new(self.store(), Domain::Project)
    }

    pub(crate) fn document_view(&self) -> DomainView<RawDocument> {
        DomainView::new(self.store(), Domain::Document)
    }

    pub(crate) fn chunk_view(&self) -> DomainView<RawChunk> {
        DomainView::new(self.store(), Domain::Chunk)
    }

    fn user_view(&self) -> DomainView<User> {
        DomainView::new(self.store(), Domain::User)
    }

    /// List every project visible to the current user.
    pub async fn projects(&self) -> CorpusResult<Vec<Project>> {
        let raw: Vec<RawProject> = self.get("/vector/projects").await?;
        let view = self.project_view();
        for project in &raw {
            view.set(&project.id.to_string(), project)?;
        }
        Ok(raw
            .into_iter()
            .map(|p| Project::new(p, self.clone()))
            .collect())
    }

    /// Fetch one project, answering from the session cache when possible.
    pub async fn project(&self, id: EntityId) -> CorpusResult<Project> {
        let view = self.project_view();
        if let Some(raw) = view.get(&id.to_string())? {
            debug!(id, "project found in cache");
            return Ok(Project::new(raw, self.clone()));
        }
        let raw: RawProject = self.get(&format!("/vector/projects/{}", id)).await?;
        view.set(&raw.id.to_string(), &raw)?;
        Ok(Project::new(raw, self.clone()))
    }

    /// List every document visible to the current user.
    pub async fn documents(&self) -> CorpusResult<Vec<Document>> {
        let envelope: DocumentsEnvelope = self.get("/vector/documents").await?;
        let view = self.document_view();
        for doc in &envelope.documents {
            view.set(&doc.id.to_string(), doc)?;
        }
        Ok(envelope
            .documents
            .into_iter()
            .map(|d| Document::new(d, self.clone()))
            .collect())
    }

    /// Fetch one document, answering from the session cache when possible.
    pub async fn document(&self, id: EntityId) -> CorpusResult<Document> {
        let view = self.document_view();
        if let Some(raw) = view.get(&id.to_string())? {
            debug!(id, "document found in cache");
            return Ok(Document::new(raw, self.clone()));
        }
        let raw: RawDocument = self.get(&format!("/vector/documents/{}", id)).await?;
        view.set(&raw.id.to_string(), &raw)?;
        Ok(Document::new(raw, self.clone()))
    }

    /// Look up a document by its exact title.
    pub async fn document_by_title(&self, title: &str) -> CorpusResult<Option<Document>> {
        let path = format!("/vector/documents/by-title/{}", percent_encode(title));
        let envelope: DocumentByTitleEnvelope = match self.get(&path).await {
            Ok(envelope) => envelope,
            Err(CorpusError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let Some(raw) = envelope.document else {
            return Ok(None);
        };
        self.document_view().set(&raw.id.to_string(), &raw)?;
        Ok(Some(Document::new(raw, self.clone())))
    }

    /// The document a chunk belongs to, or `None` if the chunk is unknown.
    pub async fn document_by_chunk_id(&self, chunk_id: EntityId) -> CorpusResult<Option<Document>> {
        let raw: RawDocument = match self
            .get(&format!("/vector/chunks/{}/document", chunk_id))
            .await
        {
            Ok(raw) => raw,
            Err(CorpusError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        self.document_view().set(&raw.id.to_string(), &raw)?;
        Ok(Some(Document::new(raw, self.clone())))
    }

    /// Fetch one chunk, answering from the session cache when possible.
    pub async fn chunk(&self, id: EntityId) -> CorpusResult<RawChunk> {
        let view = self.chunk_view();
        if let Some(chunk) = view.get(&id.to_string())? {
            debug!(id, "chunk found in cache");
            return Ok(chunk);
        }
        let chunk: RawChunk = self.get(&format!("/vector/chunks/{}", id)).await?;
        view.set(&chunk.id.to_string(), &chunk)?;
        Ok(chunk)
    }

    /// Look up a user by username, answering from the session cache when
    /// possible. Unknown usernames are `Ok(None)`.
    pub async fn user_by_username(&self, username: &str) -> CorpusResult<Option<User>> {
        let view = self.user_view();
        if let Some(user) = view.get(username)? {
            debug!(username, "user found in cache");
            return Ok(Some(user));
        }
        let user: User = match self
            .get(&format!("/users/by-username/{}", percent_encode(username)))
            .await
        {
            Ok(user) => user,
            Err(CorpusError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        view.set(&user.username, &user)?;
        Ok(Some(user))
    }

    /// Look up a user by id. The user view is keyed by username, so the
    /// cached side of this lookup scans the domain.
    pub async fn user_by_id(&self, id: EntityId) -> CorpusResult<Option<User>> {
        let view = self.user_view();
        if let Some(user) = view.values()?.into_iter().find(|u| u.id == id) {
            debug!(id, "user found in cache");
            return Ok(Some(user));
        }
        let user: User = match self.get(&format!("/users/{}", id)).await {
            Ok(user) => user,
            Err(CorpusError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        view.set(&user.username, &user)?;
        Ok(Some(user))
    }

    /// Semantic search across the corpus, optionally scoped to a project.
    pub async fn semantic_search(
        &self,
        query: &str,
        project: Option<EntityId>,
    ) -> CorpusResult<Vec<SearchResult>> {
        let mut path = format!("/semantic-search?query={}", percent_encode(query));
        if let Some(project) = project {
            path.push_str(&format!("&project={}", project));
        }
        self.get(&path).await
    }

    /// Ask the retrieval-augmented chat endpoint a question.
    pub async fn chat(
        &self,
        question: &str,
        model: &str,
        options: ChatOptions,
    ) -> CorpusResult<ChatResponse> {
        let request = ChatRequest {
            query: question.to_string(),
            model: model.to_string(),
            include: options.include,
            exclude: options.exclude,
            conversation: options.conversation,
            project: options.project,
        };
        let body = serde_json::to_value(&request)?;
        self.post("/chat", &body).await
    }
}

//! Document entity wrapper

use crate::client::CorpusClient;
use crate::types::{EntityId, RawChunk, RawDocument, User};
use corpusdb_core::cache::DomainView;
use corpusdb_core::error::CorpusResult;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

// @article{citationKey, ...
static CITATION_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)\{([^,]+),").unwrap());

/// A document owning chunks.
///
/// Chunk listings follow the same stale-while-revalidate policy as
/// [`Project::documents`](crate::Project::documents): cached chunks are
/// returned immediately once the document has been listed, while a
/// background refresh updates the shared cache for the next call.
#[derive(Clone)]
pub struct Document {
    data: RawDocument,
    client: CorpusClient,
    chunks: DomainView<RawChunk>,
    /// Ordered ids from the last successful fetch; `None` until then (Cold).
    chunk_ids: Arc<Mutex<Option<Vec<String>>>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.data.id)
            .field("title", &self.data.title)
            .finish_non_exhaustive()
    }
}

impl Document {
    pub(crate) fn new(data: RawDocument, client: CorpusClient) -> Self {
        let chunks = client.chunk_view();
        Self {
            data,
            client,
            chunks,
            chunk_ids: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> EntityId {
        self.data.id
    }

    pub fn title(&self) -> &str {
        &self.data.title
    }

    pub fn source(&self) -> Option<&str> {
        self.data.source.as_deref()
    }

    pub fn topics(&self) -> &[String] {
        &self.data.topics
    }

    pub fn doi(&self) -> Option<&str> {
        self.data.doi.as_deref()
    }

    pub fn authors(&self) -> &[String] {
        &self.data.authors
    }

    /// Username of the owning user, if any
    pub fn owner_username(&self) -> Option<&str> {
        self.data.owner.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.data.public
    }

    pub fn url(&self) -> Option<&str> {
        self.data.url.as_deref()
    }

    /// The raw backend record
    pub fn raw(&self) -> &RawDocument {
        &self.data
    }

    /// Resolve the owning user, if the document has one.
    pub async fn owner(&self) -> CorpusResult<Option<User>> {
        let Some(username) = self.data.owner.as_deref() else {
            return Ok(None);
        };
        self.client.user_by_username(username).await
    }

    /// The BibTeX citation for this document.
    pub async fn citation(&self) -> CorpusResult<String> {
        self.client
            .get(&format!("/cite/bibtex?documents={}", self.data.id))
            .await
    }

    /// The entry key of the document's BibTeX citation, e.g. `smith2021`
    /// from `@article{smith2021, ...`.
    pub async fn citation_key(&self) -> CorpusResult<Option<String>> {
        let citation = self.citation().await?;
        Ok(parse_citation_key(&citation))
    }

    async fn fetch_chunks(client: &CorpusClient, id: EntityId) -> CorpusResult<Vec<RawChunk>> {
        client.get(&format!("/vector/documents/{}/chunks", id)).await
    }

    /// List this document's chunks, stale-while-revalidate.
    ///
    /// See [`Project::documents`](crate::Project::documents) for the exact
    /// Cold/Warm semantics; the chunk cache is shared with every other
    /// wrapper derived from the same client.
    pub async fn chunks(&self) -> CorpusResult<Vec<RawChunk>> {
        let recorded = self.chunk_ids.lock().clone();
        if let Some(ids) = recorded {
            let mut chunks = Vec::with_capacity(ids.len());
            for id in &ids {
                if let Some(chunk) = self.chunks.get(id)? {
                    chunks.push(chunk);
                }
            }
            self.spawn_refresh();
            return Ok(chunks);
        }

        let fresh = Self::fetch_chunks(&self.client, self.data.id).await?;
        let mut ids = Vec::with_capacity(fresh.len());
        for chunk in &fresh {
            let key = chunk.id.to_string();
            self.chunks.set(&key, chunk)?;
            ids.push(key);
        }
        *self.chunk_ids.lock() = Some(ids);
        Ok(fresh)
    }

    fn spawn_refresh(&self) {
        let client = self.client.clone();
        let view = self.chunks.clone();
        let recorded = Arc::clone(&self.chunk_ids);
        let document_id = self.data.id;

        self.client.refreshes().spawn(async move {
            let fresh = match Self::fetch_chunks(&client, document_id).await {
                Ok(fresh) => fresh,
                Err(err) => {
                    // best-effort refresh; the caller already has its answer
                    debug!(document_id, error = %err, "background chunk refresh failed");
                    return;
                }
            };

            let mut ids = Vec::with_capacity(fresh.len());
            for chunk in &fresh {
                let key = chunk.id.to_string();
                if let Err(err) = view.set(&key, chunk) {
                    warn!(document_id, error = %err, "aborting chunk refresh");
                    return;
                }
                ids.push(key);
            }
            *recorded.lock() = Some(ids);
        });
    }
}

fn parse_citation_key(citation: &str) -> Option<String> {
    CITATION_KEY
        .captures(citation)
        .map(|captures| captures[2].to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_citation_key;

    #[test]
    fn citation_key_comes_from_the_first_entry() {
        let bibtex = "@article{smith2021deep, author = {Smith}, year = {2021}}";
        assert_eq!(parse_citation_key(bibtex).as_deref(), Some("smith2021deep"));
    }

    #[test]
    fn citation_key_handles_non_bibtex_payloads() {
        assert_eq!(parse_citation_key("no citation here"), None);
        assert_eq!(parse_citation_key(""), None);
    }
}

//! Wire-level records for the CorpusDB backend
//!
//! Field sets mirror the backend schemas; anything the backend may omit is
//! `#[serde(default)]` so older payloads keep deserializing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable backend identifier. Converted with `to_string` when used as a
/// cache key.
pub type EntityId = i64;

/// Raw project record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProject {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw document record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Username of the owning user, if any
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw chunk record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    pub id: EntityId,
    #[serde(default)]
    pub document_id: Option<EntityId>,
    pub text: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Backend user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// OAuth token response from `/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// One retrieved passage inside a search or chat response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchContent {
    pub page_content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Scored semantic search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub result: SearchContent,
    pub score: f64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// One turn of a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `/chat`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub query: String,
    pub model: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub conversation: Vec<ConversationMessage>,
    pub project: Option<EntityId>,
}

/// Answer from `/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SearchContent>,
}

/// `/vector/documents` wraps its payload in an object
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DocumentsEnvelope {
    pub documents: Vec<RawDocument>,
}

/// `/vector/documents/by-title/{title}` may answer with an empty envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DocumentByTitleEnvelope {
    #[serde(default)]
    pub document: Option<RawDocument>,
}

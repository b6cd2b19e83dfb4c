//! HTTP transport seam
//!
//! The client and entity layers consume the backend through [`Transport`]
//! only; [`HttpTransport`] is the production reqwest implementation, tests
//! plug in their own. Retry and timeout policy live outside this crate.

use async_trait::async_trait;
use corpusdb_core::error::{CorpusError, CorpusResult};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

/// JSON-over-HTTP operations the SDK needs from a backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str, bearer: Option<&str>) -> CorpusResult<Value>;

    async fn post_json(&self, path: &str, body: &Value, bearer: Option<&str>)
    -> CorpusResult<Value>;

    /// Form-encoded POST, used by the OAuth password grant.
    async fn post_form(
        &self,
        path: &str,
        fields: &[(String, String)],
        bearer: Option<&str>,
    ) -> CorpusResult<Value>;
}

/// Production transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `base_url`. The URL must carry an http(s)
    /// scheme; trailing slashes are trimmed so paths append verbatim.
    pub fn new(base_url: &str) -> CorpusResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn builder(&self, method: Method, path: &str, bearer: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute(builder: reqwest::RequestBuilder, path: &str) -> CorpusResult<Value> {
        debug!(path, "requesting");
        let response = builder
            .send()
            .await
            .map_err(|e| CorpusError::http(format!("request to {} failed: {}", path, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CorpusError::auth(format!("request to {} was rejected", path)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CorpusError::not_found(path));
        }
        if !status.is_success() {
            return Err(CorpusError::http(format!(
                "request to {} failed with status {}",
                path, status
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CorpusError::Json(format!("invalid JSON from {}: {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str, bearer: Option<&str>) -> CorpusResult<Value> {
        Self::execute(self.builder(Method::GET, path, bearer), path).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> CorpusResult<Value> {
        Self::execute(self.builder(Method::POST, path, bearer).json(body), path).await
    }

    async fn post_form(
        &self,
        path: &str,
        fields: &[(String, String)],
        bearer: Option<&str>,
    ) -> CorpusResult<Value> {
        Self::execute(self.builder(Method::POST, path, bearer).form(fields), path).await
    }
}

/// Validate and normalize a backend base URL.
pub fn normalize_base_url(url: &str) -> CorpusResult<String> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(CorpusError::invalid_input(format!(
            "base URL must start with http:// or https://, got '{}'",
            trimmed
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Percent-encode a value for use inside a path segment or query string.
/// The backend treats `?` and `&` in titles literally, so both must be
/// escaped along with everything else outside the unreserved set.
pub(crate) fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(normalize_base_url("ftp://example.org").is_err());
        assert!(normalize_base_url("example.org").is_err());
        assert!(normalize_base_url("https://example.org").is_ok());
    }

    #[test]
    fn base_url_trims_trailing_slashes() {
        assert_eq!(
            normalize_base_url("https://example.org/ ").unwrap(),
            "https://example.org"
        );
        assert_eq!(
            normalize_base_url("http://example.org//").unwrap(),
            "http://example.org"
        );
    }

    #[test]
    fn percent_encode_escapes_query_metacharacters() {
        assert_eq!(percent_encode("what? me & you"), "what%3F%20me%20%26%20you");
        assert_eq!(percent_encode("plain-title_1.2~"), "plain-title_1.2~");
    }
}

//! HTTP client for the Onionoo endpoints.
//!
//! Every request carries the configured timeout. When the cache holds a
//! document for the same query, the request is sent with
//! `If-Modified-Since` and a `304 Not Modified` reply is answered from the
//! cache.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{DATE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::cache::{CachedDocument, DocumentCache};
use crate::documents::{DetailsDocument, SummaryDocument};
use crate::query::{DocumentKind, OnionooQuery};

/// Errors from the Onionoo client.
#[derive(Debug, thiserror::Error)]
pub enum OnionooError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Onionoo returned a non-2xx status code.
    #[error("Onionoo API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected document shape.
    #[error("Invalid {kind} document: {source}")]
    Decode {
        kind: DocumentKind,
        #[source]
        source: serde_json::Error,
    },

    /// A `304` arrived for a query the cache does not hold.
    #[error("Server answered 304 for uncached {0} query")]
    NotModifiedWithoutCache(DocumentKind),
}

pub struct OnionooClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    cache: Arc<dyn DocumentCache>,
}

impl OnionooClient {
    /// * `base_url` - e.g. `https://onionoo.torproject.org/`.
    pub fn new(base_url: &str, timeout: Duration, cache: Arc<dyn DocumentCache>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, timeout, cache)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
        cache: Arc<dyn DocumentCache>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            cache,
        }
    }

    pub async fn summary(&self, query: &OnionooQuery) -> Result<SummaryDocument, OnionooError> {
        self.fetch(DocumentKind::Summary, query).await
    }

    pub async fn details(&self, query: &OnionooQuery) -> Result<DetailsDocument, OnionooError> {
        self.fetch(DocumentKind::Details, query).await
    }

    /// Fetch and decode one document, revalidating against the cache.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        kind: DocumentKind,
        query: &OnionooQuery,
    ) -> Result<T, OnionooError> {
        let key = query.cache_key(kind);
        let cached = self.cache.get(&key);

        let mut request = self
            .client
            .get(format!("{}/{}", self.base_url, kind.path()))
            .query(&query.params())
            .timeout(self.timeout);
        if let Some(since) = cached.as_ref().and_then(|c| c.last_modified.as_deref()) {
            request = request.header(IF_MODIFIED_SINCE, since);
        }

        let response = request.send().await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            tracing::debug!(%kind, "Onionoo document not modified, using cache");
            let document = cached.ok_or(OnionooError::NotModifiedWithoutCache(kind))?;
            let decoded = Self::decode(kind, &document.body)?;
            // Re-store to restart the TTL.
            self.cache.put(&key, document);
            return Ok(decoded);
        }

        let response = Self::ensure_success(response).await?;
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .or_else(|| response.headers().get(DATE))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        let decoded = Self::decode(kind, &body)?;
        self.cache.put(
            &key,
            CachedDocument {
                body,
                last_modified,
            },
        );
        Ok(decoded)
    }

    // ---- private helpers ----

    fn decode<T: DeserializeOwned>(kind: DocumentKind, body: &str) -> Result<T, OnionooError> {
        serde_json::from_str(body).map_err(|source| OnionooError::Decode { kind, source })
    }

    /// Return the response unchanged on success, or an
    /// [`OnionooError::Status`] with the body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, OnionooError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OnionooError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

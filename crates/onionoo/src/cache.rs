//! Document cache handed explicitly to [`OnionooClient`](crate::OnionooClient).
//!
//! Entries carry the `Last-Modified` value the server sent with them so the
//! client can revalidate with `If-Modified-Since`. An entry older than the
//! cache TTL is treated as absent.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A raw response body as last received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDocument {
    pub body: String,
    /// Value for `If-Modified-Since` on revalidation.
    pub last_modified: Option<String>,
}

pub trait DocumentCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedDocument>;

    fn put(&self, key: &str, document: CachedDocument);
}

/// Process-local cache with a fixed time-to-live.
pub struct InMemoryDocumentCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, CachedDocument)>>,
}

impl InMemoryDocumentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentCache for InMemoryDocumentCache {
    fn get(&self, key: &str) -> Option<CachedDocument> {
        let mut entries = self.entries.lock().ok()?;
        let expired = entries
            .get(key)
            .map(|(stored_at, _)| stored_at.elapsed() >= self.ttl)?;
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(_, document)| document.clone())
    }

    fn put(&self, key: &str, document: CachedDocument) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (Instant::now(), document));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> CachedDocument {
        CachedDocument {
            body: body.to_string(),
            last_modified: Some("Sat, 01 Jun 2024 12:00:00 GMT".to_string()),
        }
    }

    #[test]
    fn put_then_get() {
        let cache = InMemoryDocumentCache::new(Duration::from_secs(60));
        cache.put("details;a", doc("{}"));
        assert_eq!(cache.get("details;a"), Some(doc("{}")));
        assert!(cache.get("details;b").is_none());
    }

    #[test]
    fn put_replaces_entry() {
        let cache = InMemoryDocumentCache::new(Duration::from_secs(60));
        cache.put("k", doc("old"));
        cache.put("k", doc("new"));
        assert_eq!(cache.get("k").unwrap().body, "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = InMemoryDocumentCache::new(Duration::ZERO);
        cache.put("k", doc("{}"));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }
}

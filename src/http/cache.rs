//! In-memory response cache
//!
//! Successful JSON bodies are kept for the lifetime of the process, keyed by
//! the full URL plus the query parameters in sorted order.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-lifetime cache of parsed JSON responses
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl ResponseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache key for a request
    pub fn key(url: &str, query: &HashMap<String, String>) -> String {
        if query.is_empty() {
            return url.to_string();
        }
        let sorted: BTreeMap<_, _> = query.iter().collect();
        let params: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{url}?{}", params.join("&"))
    }

    /// Look up a cached body
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Store a body
    pub async fn insert(&self, key: String, value: Value) {
        self.entries.write().await.insert(key, value);
    }

    /// Number of cached responses
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds nothing
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

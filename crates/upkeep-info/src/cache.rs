//! Per-run inventory cache

use crate::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// A per-run cache with at-most-once-per-key fetching.
///
/// Concurrent lookups of the same key share one in-flight fetch; a failed
/// fetch caches nothing, so the next lookup tries again. The cache is
/// scoped to one pipeline run and discarded with its provider.
pub(crate) struct FetchCache<V> {
    cells: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> FetchCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, fetching it at most once.
    pub(crate) async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key.to_string()).or_default())
        };
        let value = cell.get_or_try_init(fetch).await?;
        Ok(value.clone())
    }
}

//! Request-scoped single-flight cache
//!
//! Created at the start of one pipeline run and dropped with it. Each key
//! owns a `OnceCell`; the first caller runs the fetch, concurrent callers
//! for the same key await that result, and later callers reuse it. Failed
//! lookups are stored too (as whatever default the fetch returns).

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

pub struct RequestCache<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for RequestCache<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> RequestCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, running `fetch` at most once per key
    #[tracing::instrument(name = "request_cache", level = "trace", skip(self, fetch))]
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            slots
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        slot.get_or_init(fetch).await.clone()
    }

    /// Number of keys seen so far
    pub fn key_count(&self) -> usize {
        self.slots.lock().len()
    }
}

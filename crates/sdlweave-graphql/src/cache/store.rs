//! Backing stores for compiled documents.

use std::sync::Arc;

use dashmap::DashMap;

/// A concurrent map from cache key to compiled document.
///
/// Stored values are never replaced: the first value stored under a key stays
/// authoritative until the store itself evicts it.
pub trait DocumentStore<D>: Send + Sync {
    /// Returns the stored document for `key`.
    fn get(&self, key: &str) -> Option<Arc<D>>;

    /// Stores `value` unless `key` already holds a document, and returns
    /// whichever document is stored afterwards.
    fn put_if_absent(&self, key: String, value: Arc<D>) -> Arc<D>;
}

/// Bounded store; eviction (size-based, TinyLFU) is moka's.
impl<D> DocumentStore<D> for moka::sync::Cache<String, Arc<D>>
where
    D: Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<Arc<D>> {
        moka::sync::Cache::get(self, key)
    }

    fn put_if_absent(&self, key: String, value: Arc<D>) -> Arc<D> {
        self.entry(key).or_insert(value).into_value()
    }
}

/// Unbounded store.
impl<D> DocumentStore<D> for DashMap<String, Arc<D>>
where
    D: Send + Sync,
{
    fn get(&self, key: &str) -> Option<Arc<D>> {
        DashMap::get(self, key).map(|entry| Arc::clone(entry.value()))
    }

    fn put_if_absent(&self, key: String, value: Arc<D>) -> Arc<D> {
        Arc::clone(self.entry(key).or_insert(value).value())
    }
}

/// Creates a bounded store holding at most `max_size` documents.
pub fn bounded_store<D>(max_size: u64) -> moka::sync::Cache<String, Arc<D>>
where
    D: Send + Sync + 'static,
{
    moka::sync::Cache::new(max_size)
}

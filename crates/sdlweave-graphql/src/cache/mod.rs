//! Preparsed-query cache.
//!
//! Compiling a query (parsing it into an executable document and validating
//! it against the schema) is done once per distinct key. The key is either
//! the literal query text or, for projection requests, a logical name
//! resolved to query text on a miss.
//!
//! ## Semantics
//!
//! - A stored entry is returned as is, with no freshness check.
//! - A miss resolves the text to compile and runs the compute function; the
//!   result is stored with set-if-absent, so concurrent misses on one key
//!   converge on the first stored document.
//! - Failures (unknown projection name, compute error) are returned to the
//!   caller and logged, but never stored: the next call retries.
//!
//! Two concurrent misses may both compute. The work is wasted, not wrong.

mod document;
mod entry;
mod store;
mod validation;

pub use document::PreparsedDocument;
pub use entry::{CLASSIFICATION_EXTENSION, CacheEntry, ErrorClassification, QueryError};
pub use store::{DocumentStore, bounded_store};
pub use validation::{ValidateOnly, ValidationGate};

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::QueryCacheConfig;
use crate::context::RequestContext;
use crate::projection::QueryNameResolver;

/// The cache the HTTP handlers use.
pub type QueryCache = PreparsedQueryCache<PreparsedDocument>;

/// Cache of compiled documents keyed by query text or projection name.
///
/// Query text and projection names share one key space. Once the projection
/// `byId` is cached, an open request whose query text is literally `byId`
/// gets that projection's document.
pub struct PreparsedQueryCache<D> {
    store: Arc<dyn DocumentStore<D>>,
    resolver: Arc<dyn QueryNameResolver>,
}

impl<D> Clone for PreparsedQueryCache<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<D> fmt::Debug for PreparsedQueryCache<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparsedQueryCache").finish_non_exhaustive()
    }
}

impl<D> PreparsedQueryCache<D>
where
    D: Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn DocumentStore<D>>, resolver: Arc<dyn QueryNameResolver>) -> Self {
        Self { store, resolver }
    }

    /// A cache holding at most `max_size` documents.
    pub fn bounded(max_size: u64, resolver: Arc<dyn QueryNameResolver>) -> Self {
        Self::new(Arc::new(bounded_store::<D>(max_size)), resolver)
    }

    /// A cache that never evicts.
    pub fn unbounded(resolver: Arc<dyn QueryNameResolver>) -> Self {
        Self::new(Arc::new(DashMap::<String, Arc<D>>::new()), resolver)
    }

    /// Creates the cache described by `config`.
    pub fn from_config(config: &QueryCacheConfig, resolver: Arc<dyn QueryNameResolver>) -> Self {
        if config.bounded {
            debug!(max_size = config.max_size, "Using bounded query cache");
            Self::bounded(config.max_size, resolver)
        } else {
            debug!("Using unbounded query cache");
            Self::unbounded(resolver)
        }
    }

    /// Returns the stored document for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<D>> {
        self.store.get(key)
    }

    /// Returns the document for `key`, compiling it on a miss.
    ///
    /// `compute` receives the resolved query text: `key` itself for open
    /// queries, the text registered under the name `key` for projection
    /// requests.
    pub fn get_document<F, E>(&self, key: &str, context: &RequestContext, compute: F) -> CacheEntry<D>
    where
        F: FnOnce(&str) -> Result<D, E>,
        E: fmt::Display,
    {
        match self.miss_text(key, context) {
            Ok(text) => self.complete(key, context, compute(&text)),
            Err(entry) => entry,
        }
    }

    /// [`get_document`](Self::get_document) with an asynchronous compute
    /// step, such as [`PreparsedDocument::compile`].
    pub async fn get_document_async<F, Fut, E>(
        &self,
        key: &str,
        context: &RequestContext,
        compute: F,
    ) -> CacheEntry<D>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<D, E>>,
        E: fmt::Display,
    {
        match self.miss_text(key, context) {
            Ok(text) => self.complete(key, context, compute(text).await),
            Err(entry) => entry,
        }
    }

    /// The text to compile on a miss, or the entry to return right away.
    fn miss_text(&self, key: &str, context: &RequestContext) -> Result<String, CacheEntry<D>> {
        if let Some(document) = self.store.get(key) {
            debug!(key, "Query cache hit");
            return Err(CacheEntry::Document(document));
        }

        self.resolve(key, context.projection).map_err(|error| {
            warn!(key, request_id = %context.request_id, error = %error, "Query name resolution failed");
            CacheEntry::Error(error)
        })
    }

    fn complete<E>(&self, key: &str, context: &RequestContext, computed: Result<D, E>) -> CacheEntry<D>
    where
        E: fmt::Display,
    {
        match computed {
            Ok(document) => {
                let stored = self.store.put_if_absent(key.to_string(), Arc::new(document));
                debug!(key, "Query cached");
                CacheEntry::Document(stored)
            }
            Err(e) => {
                let error = QueryError::validation(e.to_string());
                warn!(key, request_id = %context.request_id, error = %error, "Query compilation failed");
                CacheEntry::Error(error)
            }
        }
    }

    /// Resolves the text to compile for `key`.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error when `projection` is set and no query is
    /// registered under the name `key`.
    pub fn resolve(&self, key: &str, projection: bool) -> Result<String, QueryError> {
        if !projection {
            return Ok(key.to_string());
        }
        self.resolver
            .resolve(key)
            .ok_or_else(|| QueryError::unknown_query_name(key))
    }
}

use crate::core::{Result, User};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Bounded query-result cache
///
/// Keyed by a caller-chosen query label, least-recently-used eviction at a
/// fixed capacity. The cache is an explicit value owned by the caller and
/// passed where it is needed; it is never process-global and never implicitly
/// shared between unrelated call sites.
///
/// # Examples
///
/// ```
/// # use std::num::NonZeroUsize;
/// # use std::sync::Arc;
/// # use userdb::{ConnectionScope, QueryCache, UserStore};
/// # fn main() -> userdb::Result<()> {
/// let store = Arc::new(UserStore::new());
/// let scope = ConnectionScope::new(Arc::clone(&store));
/// let cache = QueryCache::new(NonZeroUsize::new(32).unwrap());
///
/// let rows = cache.get_or_fetch("all users", || scope.run(|conn| conn.fetch_all()))?;
/// assert!(rows.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct QueryCache {
    entries: Mutex<LruCache<String, Arc<Vec<User>>>>,
}

impl QueryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached result for `query`, or run `fetch` and cache it.
    ///
    /// A fetch fault is propagated and nothing is cached for the key.
    pub fn get_or_fetch<F>(&self, query: &str, fetch: F) -> Result<Arc<Vec<User>>>
    where
        F: FnOnce() -> Result<Vec<User>>,
    {
        if let Some(hit) = self.get(query)? {
            log::debug!("cache hit for query: {}", query);
            return Ok(hit);
        }

        let rows = Arc::new(fetch()?);
        self.entries.lock()?.put(query.to_string(), Arc::clone(&rows));
        log::debug!("query cached: {}", query);
        Ok(rows)
    }

    /// Look up a key without fetching (refreshes recency on hit).
    pub fn get(&self, query: &str) -> Result<Option<Arc<Vec<User>>>> {
        Ok(self.entries.lock()?.get(query).cloned())
    }

    /// Drop one cached entry, e.g. after a mutation invalidates it.
    pub fn invalidate(&self, query: &str) -> Result<()> {
        self.entries.lock()?.pop(query);
        Ok(())
    }

    /// Drop every cached entry.
    pub fn clear(&self) -> Result<()> {
        self.entries.lock()?.clear();
        Ok(())
    }

    /// Number of cached entries (never exceeds capacity).
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

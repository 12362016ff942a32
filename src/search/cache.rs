//! Search result caching
//!
//! Ranked result lists are cached per (query, site scope) for a limited time.
//! Entries for a site, and every all-site entry, are dropped when that site
//! starts re-indexing.

use crate::config::SearchConfig;
use crate::search::RankedPage;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cache key: the trimmed query and the site URL, or None for all sites
type CacheKey = (String, Option<String>);

/// Upper bound on the TTL (one year)
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// A cached ranked list with its creation time
#[derive(Debug, Clone)]
pub struct CachedResults {
    pub pages: Arc<Vec<RankedPage>>,
    pub cached_at: DateTime<Utc>,
}

impl CachedResults {
    pub fn new(pages: Arc<Vec<RankedPage>>) -> Self {
        Self {
            pages,
            cached_at: Utc::now(),
        }
    }

    /// Checks if the entry is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at
    }
}

/// Bounded, time-boxed cache of ranked search results
#[derive(Debug)]
pub struct SearchCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, CachedResults>>,
}

impl SearchCache {
    /// Creates a cache; a capacity of 0 disables caching
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.cache_ttl_secs, config.cache_capacity)
    }

    /// Returns the cached list for a query, dropping it if stale
    pub fn get(&self, query: &str, site: Option<&str>) -> Option<Arc<Vec<RankedPage>>> {
        let key = (query.to_string(), site.map(String::from));
        let mut entries = self.entries();

        match entries.get(&key) {
            Some(entry) if !entry.is_stale(self.ttl) => Some(entry.pages.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores a ranked list, evicting the oldest entry when full
    pub fn insert(&self, query: &str, site: Option<&str>, pages: Arc<Vec<RankedPage>>) {
        if self.capacity == 0 {
            return;
        }

        let key = (query.to_string(), site.map(String::from));
        let mut entries = self.entries();

        let ttl = self.ttl;
        entries.retain(|_, entry| !entry.is_stale(ttl));

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.cached_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(key, CachedResults::new(pages));
    }

    /// Drops entries scoped to `site_url` and every all-site entry
    pub fn invalidate_site(&self, site_url: &str) {
        self.entries()
            .retain(|(_, site), _| matches!(site, Some(url) if url != site_url));
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned cache only holds derived data, so keep using it
    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CachedResults>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

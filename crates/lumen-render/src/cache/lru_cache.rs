use lru::LruCache;

/// Hit/miss counters, reset with the cache.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded `key -> resource` cache with least-recently-used expiry.
///
/// The cache never frees GPU memory itself: evicted values are handed back
/// to the caller, which owns the backend and releases them.
pub struct ResourceCache<V> {
    entries: LruCache<u64, V>,
    limit: usize,
    stats: CacheStats,
    label: &'static str,
}

impl<V: Clone> ResourceCache<V> {
    /// `limit` is clamped to at least one entry so a freshly created value is
    /// never evicted before it is returned.
    pub fn new(label: &'static str, limit: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            limit: limit.max(1),
            stats: CacheStats::default(),
            label,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Membership test that does not touch recency.
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.entries.contains(&key)
    }

    /// Keys from least to most recently used.
    pub fn keys_oldest_first(&self) -> Vec<u64> {
        self.entries.iter().rev().map(|(k, _)| *k).collect()
    }

    /// Returns the cached value for `key` (promoting it to most recently
    /// used) or creates and inserts a new one.
    ///
    /// The second element holds the values evicted to get back under the
    /// limit; the caller must release them.
    pub fn get_or_try_create<E>(
        &mut self,
        key: u64,
        create: impl FnOnce() -> Result<V, E>,
    ) -> Result<(V, Vec<V>), E> {
        if let Some(v) = self.entries.get(&key) {
            self.stats.hits += 1;
            return Ok((v.clone(), Vec::new()));
        }

        let value = create()?;
        self.stats.misses += 1;
        self.entries.put(key, value.clone());

        let evicted = self.expire(self.limit);
        Ok((value, evicted))
    }

    /// Cached value for `key`, promoted to most recently used.
    pub fn get(&mut self, key: u64) -> Option<V> {
        let v = self.entries.get(&key).cloned();
        if v.is_some() {
            self.stats.hits += 1;
        }
        v
    }

    /// Drops `key` from the cache and hands its value back for release.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        self.entries.pop(&key)
    }

    /// Evicts least-recently-used entries until at most `max` remain and
    /// returns them, oldest first.
    pub fn expire(&mut self, max: usize) -> Vec<V> {
        let mut evicted = Vec::new();
        while self.entries.len() > max {
            let Some((key, value)) = self.entries.pop_lru() else {
                break;
            };
            log::trace!("{} cache: expiring {key:#014x}", self.label);
            evicted.push(value);
        }
        self.stats.evictions += evicted.len() as u64;
        evicted
    }

    /// Removes every entry and returns the values for release.
    pub fn clear(&mut self) -> Vec<V> {
        let all = self.expire(0);
        if !all.is_empty() {
            log::debug!("{} cache: cleared {} entries", self.label, all.len());
        }
        self.stats = CacheStats::default();
        all
    }

    /// Drops every entry without releasing anything (the backing context is gone).
    pub fn forget(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }
}

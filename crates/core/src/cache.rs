use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
};

/// Deterministic hash of a stage input, stable for the life of the process
pub fn cache_key<K: Hash + ?Sized>(input: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Session-lifetime memo cache for one pipeline stage.
///
/// Entries are addressed by [`cache_key`] but also keep the full key, so a
/// hash collision between different inputs is treated as a miss. There is no
/// eviction.
#[derive(Debug)]
pub struct StageCache<K, V> {
    entries: HashMap<u64, (K, V)>,
    stats: CacheStats,
}

impl<K, V> Default for StageCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<K: Hash + Eq, V: Clone> StageCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries
            .get(&cache_key(key))
            .filter(|(stored, _)| stored == key)
            .map(|(_, value)| value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(cache_key(&key), (key, value));
    }

    /// Return the memoized value for `key`, running `compute` only on a miss.
    pub async fn get_or_compute<F, Fut>(&mut self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key) {
            let value = value.clone();
            self.stats.hits += 1;
            tracing::debug!(hits = self.stats.hits, "cache hit");
            return value;
        }

        self.stats.misses += 1;
        let value = compute().await;
        self.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

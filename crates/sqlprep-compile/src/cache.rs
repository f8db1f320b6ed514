//! Bounded, thread-safe statement cache
//!
//! Maps a composite key (SQL text hash, parameter shape hash, dialect) to an
//! immutable compiled state. `get` promotes the entry to most-recently-used;
//! inserting beyond the bound evicts the least-recently-used entry.
//!
//! The lock is held only for the duration of the map mutation, never while
//! SQL is being parsed or transformed, so concurrent compiles of different
//! statements only serialize on the final cache write. Two threads missing
//! on the same key may both process and both write; processing is
//! deterministic and idempotent, so the first write wins and the second
//! compute is merely redundant.

use crate::compiler::CompiledState;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sqlprep_core::SqlDialect;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Composite cache key: SQL text, parameter shape, and dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Hash of the raw SQL text
    pub statement_hash: u64,
    /// Hash of the parameter shape descriptor (kinds, names, arity, value
    /// type tags; never value contents)
    pub shape_hash: u64,
    /// The effective dialect
    pub dialect: &'static str,
}

impl CacheKey {
    /// Build a key from its parts
    pub fn new(statement_hash: u64, shape_hash: u64, dialect: SqlDialect) -> Self {
        Self {
            statement_hash,
            shape_hash,
            dialect: dialect.as_str(),
        }
    }
}

/// Point-in-time cache statistics for operational introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries currently held
    pub size: usize,
    /// Configured bound
    pub capacity: usize,
}

/// Thread-safe bounded LRU cache of compiled statements
pub struct StatementCache {
    inner: Mutex<LruCache<CacheKey, Arc<CompiledState>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatementCache {
    /// Create a cache bounded to `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("clamped to at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a compiled state, promoting it to most-recently-used
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CompiledState>> {
        let hit = self.inner.lock().get(key).cloned();
        match &hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Store a compiled state unless another thread won the race, in which
    /// case the already-stored state is returned instead.
    pub fn get_or_insert(&self, key: CacheKey, state: Arc<CompiledState>) -> Arc<CompiledState> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.get(&key) {
            return Arc::clone(existing);
        }
        inner.put(key, Arc::clone(&state));
        state
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drop every entry; counters are preserved
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Point-in-time statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: inner.len(),
            capacity: inner.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::StatementCompiler;
    use sqlprep_core::CompilerConfig;

    fn state_for(sql: &str) -> Arc<CompiledState> {
        let compiler = StatementCompiler::new(CompilerConfig::default());
        Arc::clone(compiler.compile(sql, ()).expect("compiles").state())
    }

    fn key(n: u64) -> CacheKey {
        CacheKey::new(n, 0, SqlDialect::Ansi)
    }

    #[test]
    fn test_get_or_insert_first_writer_wins() {
        let cache = StatementCache::new(4);
        let first = state_for("SELECT 1");
        let second = state_for("SELECT 1");
        assert!(!Arc::ptr_eq(&first, &second));

        let stored = cache.get_or_insert(key(1), Arc::clone(&first));
        assert!(Arc::ptr_eq(&stored, &first));
        // A racing second write returns the existing entry untouched.
        let stored = cache.get_or_insert(key(1), second);
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache = StatementCache::new(2);
        let state = state_for("SELECT 1");
        cache.get_or_insert(key(1), Arc::clone(&state));
        cache.get_or_insert(key(2), Arc::clone(&state));
        cache.get_or_insert(key(3), Arc::clone(&state));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn test_get_promotes_to_most_recently_used() {
        let cache = StatementCache::new(2);
        let state = state_for("SELECT 1");
        cache.get_or_insert(key(1), Arc::clone(&state));
        cache.get_or_insert(key(2), Arc::clone(&state));
        // Touch key 1 so key 2 becomes the eviction candidate.
        assert!(cache.get(&key(1)).is_some());
        cache.get_or_insert(key(3), Arc::clone(&state));

        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_none());
    }

    #[test]
    fn test_keys_distinguish_dialect_and_shape() {
        assert_ne!(key(1), CacheKey::new(1, 0, SqlDialect::PostgreSql));
        assert_ne!(key(1), CacheKey::new(1, 9, SqlDialect::Ansi));
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = StatementCache::new(2);
        let state = state_for("SELECT 1");
        cache.get_or_insert(key(1), state);
        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(9)).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 2);

        cache.clear();
        assert!(cache.is_empty());
        // Counters survive a clear.
        assert_eq!(cache.stats().hits, 1);
    }
}

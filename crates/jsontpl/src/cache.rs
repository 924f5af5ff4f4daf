use anyhow::Result;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::{CompileOptions, Executable, Value, compile_with};

pub const DEFAULT_CACHE_CAPACITY: usize = 128;

type CacheKey = (CompileOptions, String);

/// Memoizes [`compile_with`] for JSON templates.
///
/// Entries are keyed by the serialized template and the options used, so
/// the same template compiled with different delimiters is cached twice.
pub struct ExecutableCache {
    cache: Mutex<LruCache<CacheKey, Executable>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl ExecutableCache {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get_or_compile(
        &self,
        template: &serde_json::Value,
        options: &CompileOptions,
    ) -> Result<Executable> {
        let key = (options.clone(), serde_json::to_string(template)?);

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(exe) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(len = key.1.len(), "executable cache hit");
                return Ok(exe.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(len = key.1.len(), "executable cache miss");

        // Compile without holding the lock; failures are not cached.
        let exe = compile_with(&Value::from(template), options)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, exe.clone());
        }
        Ok(exe)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.cache.lock().map(|c| c.len()).unwrap_or(0);
        CacheStats {
            entries,
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ExecutableCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

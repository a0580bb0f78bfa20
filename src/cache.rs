use crate::error::Result;
use lru::LruCache;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::debug;

/// Content hash of a stage's inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    /// Hashes the canonical JSON encoding of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self(blake3::hash(&bytes)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    /// Derives a key for a downstream stage from this key plus extra parameters.
    pub fn chain<T: Serialize + ?Sized>(&self, stage: &str, params: &T) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.0.as_bytes());
        hasher.update(stage.as_bytes());
        hasher.update(&serde_json::to_vec(params)?);
        Ok(Self(hasher.finalize()))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

/// Bounded memo cache for one pipeline stage.
pub struct StageCache<V> {
    name: &'static str,
    entries: LruCache<Fingerprint, V>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> StageCache<V> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    /// Failed computations are not cached.
    pub fn get_or_try_insert<F>(&mut self, key: Fingerprint, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            debug!(stage = self.name, ?key, "cache hit");
            return Ok(value.clone());
        }
        self.misses += 1;
        debug!(stage = self.name, ?key, "cache miss");
        let value = compute()?;
        self.entries.put(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

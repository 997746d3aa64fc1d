//! Bounded caches for file metadata and waveform peaks
//!
//! A cache is an ordinary value owned by whoever needs it (render service,
//! host app); there is no process-wide instance. When full, the least
//! recently touched entry is dropped, so the newest `capacity` entries stay.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::FileResult;
use crate::wav::{read_wav, read_wav_info, WavInfo};
use crate::waveform::peaks;

/// Default number of entries kept per cache
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

struct CacheEntry<V> {
    value: V,
    last_access: u64,
}

/// Thread-safe cache with a fixed entry count
pub struct BoundedCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    access_counter: AtomicU64,
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            access_counter: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached value, marking it as recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write();
        entries.get_mut(key).map(|entry| {
            entry.last_access = self.access_counter.fetch_add(1, Ordering::Relaxed);
            entry.value.clone()
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Insert or replace, evicting the stalest entry when full
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write();
        if !entries.contains_key(&key) {
            while entries.len() >= self.capacity {
                let stalest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_access)
                    .map(|(k, _)| k.clone());
                match stalest {
                    Some(k) => {
                        entries.remove(&k);
                        log::debug!("Evicted cache entry {:?}", k);
                    }
                    None => break,
                }
            }
        }
        let last_access = self.access_counter.fetch_add(1, Ordering::Relaxed);
        entries.insert(key, CacheEntry { value, last_access });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().remove(key).map(|entry| entry.value)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, V> Default for BoundedCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPECIALIZED CACHES
// ═══════════════════════════════════════════════════════════════════════════════

/// URI → WAV format summary
pub type MetadataCache = BoundedCache<String, WavInfo>;

/// URI → waveform peaks
pub type WaveformCache = BoundedCache<String, Arc<[f32]>>;

/// Key both caches use for a file on disk
pub fn cache_key(path: &Path) -> String {
    path.display().to_string()
}

impl BoundedCache<String, WavInfo> {
    /// Format of the file at `path`, read from disk on a miss
    pub fn probe(&self, path: &Path) -> FileResult<WavInfo> {
        let key = cache_key(path);
        if let Some(info) = self.get(&key) {
            return Ok(info);
        }
        let info = read_wav_info(path)?;
        self.insert(key, info);
        Ok(info)
    }
}

impl BoundedCache<String, Arc<[f32]>> {
    /// `points` peaks of the WAV file at `path`, decoded on a miss
    pub fn peaks_for(&self, path: &Path, points: usize) -> FileResult<Arc<[f32]>> {
        let key = cache_key(path);
        if let Some(cached) = self.get(&key) {
            return Ok(cached);
        }
        let waveform: Arc<[f32]> = peaks(&read_wav(path)?, points).into();
        self.insert(key, Arc::clone(&waveform));
        Ok(waveform)
    }
}

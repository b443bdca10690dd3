//! Keyed search-result cache
//!
//! Repeated runs over identical inputs reuse a finished search instead of
//! repeating it. A key captures everything that determines a search outcome:
//! family, search space, training data, seed, trial count and fold count.
//! Concurrent callers for the same key wait on a per-key lock, so a given
//! search runs at most once at a time.

use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::optimizer::{SearchConfig, SearchResult};
use crate::training::ModelFamily;

/// Identity of one search
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub family: String,
    /// SHA-256 of the search space's JSON form
    pub space_hash: String,
    /// SHA-256 of the training matrix and labels
    pub data_hash: String,
    pub seed: u64,
    pub n_trials: usize,
    pub folds: usize,
    /// Model seed of randomized families, independent of the search seed
    pub random_state: Option<u64>,
}

impl CacheKey {
    pub fn new<S: Serialize>(
        family: &str,
        space: &S,
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: &SearchConfig,
    ) -> Result<Self> {
        Ok(Self {
            family: family.to_string(),
            space_hash: hash_space(space)?,
            data_hash: hash_data(x, y),
            seed: config.seed,
            n_trials: config.n_trials,
            folds: config.folds,
            random_state: None,
        })
    }

    /// Key one family's search, including its model seed
    pub fn for_family<F: ModelFamily>(
        family: &F,
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: &SearchConfig,
    ) -> Result<Self> {
        let mut key = Self::new(family.name(), family.search_space(), x, y, config)?;
        key.random_state = family.random_state();
        Ok(key)
    }
}

/// SHA-256 hex digest of a value's JSON encoding
pub fn hash_space<S: Serialize>(space: &S) -> Result<String> {
    let bytes = serde_json::to_vec(space)?;
    Ok(compute_sha256(&bytes))
}

/// SHA-256 hex digest of the shape and little-endian values of `(x, y)`
pub fn hash_data(x: &Array2<f64>, y: &Array1<f64>) -> String {
    let mut hasher = Sha256::new();
    hasher.update((x.nrows() as u64).to_le_bytes());
    hasher.update((x.ncols() as u64).to_le_bytes());
    for v in x.iter() {
        hasher.update(v.to_le_bytes());
    }
    hasher.update((y.len() as u64).to_le_bytes());
    for v in y.iter() {
        hasher.update(v.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Compute SHA-256 hash of data
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

type Slot<V> = Arc<Mutex<Option<V>>>;

/// Thread-safe cache of finished searches
pub struct SearchCache<V = SearchResult> {
    entries: Mutex<HashMap<CacheKey, Slot<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Default for SearchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> SearchCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached result for `key`, or run `search` and store its
    /// result. Errors are returned to the caller and not stored.
    pub fn get_or_search<F>(&self, key: &CacheKey, search: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        // The map lock is never held while waiting on a slot
        let slot = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(None))))
        };

        let mut guard = slot.lock();
        if let Some(value) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(family = %key.family, seed = key.seed, "Search cache hit");
            return Ok(value.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(family = %key.family, seed = key.seed, "Search cache miss");
        let value = match search() {
            Ok(value) => value,
            Err(e) => {
                drop(guard);
                self.discard_unused(key, &slot);
                return Err(e);
            }
        };
        *guard = Some(value.clone());
        Ok(value)
    }

    /// Remove a slot left empty by a failed search, unless another caller
    /// is already waiting on it
    fn discard_unused(&self, key: &CacheKey, slot: &Slot<V>) {
        let mut entries = self.entries.lock();
        let same_slot = entries.get(key).map_or(false, |current| Arc::ptr_eq(current, slot));
        // Slots are only cloned under the map lock, so the count cannot grow here
        if same_slot && Arc::strong_count(slot) == 2 && slot.lock().is_none() {
            entries.remove(key);
        }
    }

    /// Cached value for `key`, if a search has finished
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let slot = self.entries.lock().get(key).cloned()?;
        let guard = slot.lock();
        guard.clone()
    }

    /// Drop one entry; returns whether it existed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of finished searches held. Searches still running are not
    /// counted.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|slot| slot.try_lock().map_or(false, |guard| guard.is_some()))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TissueError;
    use ndarray::array;
    use std::sync::atomic::AtomicUsize;

    fn key(seed: u64) -> CacheKey {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        CacheKey::new("knn", &vec![1, 2, 3], &x, &y, &SearchConfig::new().with_seed(seed)).unwrap()
    }

    #[test]
    fn test_hit_and_miss_accounting() {
        let cache: SearchCache<u32> = SearchCache::new();
        let k = key(1);

        assert_eq!(cache.get_or_search(&k, || Ok(7)).unwrap(), 7);
        assert_eq!(cache.get_or_search(&k, || Ok(99)).unwrap(), 7);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&k), Some(7));
    }

    #[test]
    fn test_failures_not_cached() {
        let cache: SearchCache<u32> = SearchCache::new();
        let k = key(2);
        let err = cache
            .get_or_search(&k, || Err(TissueError::InvalidInput("boom".to_string())))
            .unwrap_err();
        assert!(matches!(err, TissueError::InvalidInput(_)));
        assert!(cache.is_empty());
        assert_eq!(cache.entries.lock().len(), 0);
        assert_eq!(cache.get_or_search(&k, || Ok(3)).unwrap(), 3);
    }

    #[test]
    fn test_failed_keys_leave_no_slots() {
        let cache: SearchCache<u32> = SearchCache::new();
        for seed in 0..10 {
            let _ = cache.get_or_search(&key(seed), || Err(TissueError::InvalidInput("boom".to_string())));
        }
        assert_eq!(cache.entries.lock().len(), 0);
        assert_eq!(cache.misses(), 10);
    }

    #[test]
    fn test_key_includes_family_random_state() {
        use crate::training::DecisionTreeFamily;

        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        let config = SearchConfig::new();
        let a = CacheKey::for_family(&DecisionTreeFamily::default().with_random_state(1), &x, &y, &config).unwrap();
        let b = CacheKey::for_family(&DecisionTreeFamily::default().with_random_state(2), &x, &y, &config).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.random_state, Some(1));

        let knn = CacheKey::for_family(&crate::training::KnnFamily::default(), &x, &y, &config).unwrap();
        assert_eq!(knn.random_state, None);
    }

    #[test]
    fn test_single_flight() {
        let cache: Arc<SearchCache<usize>> = Arc::new(SearchCache::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let k = key(3);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let runs = Arc::clone(&runs);
                let k = k.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_search(&k, || {
                            runs.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            Ok(42)
                        })
                        .unwrap()
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 7);
    }

    #[test]
    fn test_key_sensitivity() {
        assert_ne!(key(1), key(2));
        let a = hash_data(&array![[1.0, 2.0]], &array![0.0]);
        let b = hash_data(&array![[1.0], [2.0]], &array![0.0, 0.0]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache: SearchCache<u32> = SearchCache::new();
        cache.get_or_search(&key(1), || Ok(1)).unwrap();
        cache.get_or_search(&key(2), || Ok(2)).unwrap();
        assert!(cache.invalidate(&key(1)));
        assert!(!cache.invalidate(&key(1)));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}

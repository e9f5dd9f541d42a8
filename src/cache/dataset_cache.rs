use crate::processor::CleanedDataset;
use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// A cache lookup result: the dataset and whether it was already cached.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub dataset: Arc<CleanedDataset>,
    pub hit: bool,
}

/// Cleaned datasets keyed by the SHA-256 of the uploaded bytes.
///
/// Holds at most `capacity` datasets and evicts the oldest insertion first.
pub struct DatasetCache {
    capacity: usize,
    entries: HashMap<String, Arc<CleanedDataset>>,
    insertion_order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl DatasetCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached dataset for `bytes`, or build it with `clean` and keep it.
    /// A failed build is not cached.
    pub fn get_or_clean<F>(&mut self, bytes: &[u8], clean: F) -> Result<CacheEntry>
    where
        F: FnOnce() -> Result<CleanedDataset>,
    {
        let key = content_hash(bytes);

        if let Some(dataset) = self.entries.get(&key) {
            self.hits += 1;
            debug!("Cache hit for {}", &key[..12]);
            return Ok(CacheEntry {
                key,
                dataset: Arc::clone(dataset),
                hit: true,
            });
        }

        self.misses += 1;
        let dataset = Arc::new(clean()?);
        self.insert(key.clone(), Arc::clone(&dataset));

        Ok(CacheEntry {
            key,
            dataset,
            hit: false,
        })
    }

    fn insert(&mut self, key: String, dataset: Arc<CleanedDataset>) {
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            info!("Evicted cached dataset {}", &oldest[..12]);
        }

        self.insertion_order.push_back(key.clone());
        self.entries.insert(key, dataset);
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.entries.contains_key(&content_hash(bytes))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CleaningSummary;
    use anyhow::anyhow;
    use polars::prelude::DataFrame;
    use std::cell::Cell;

    fn dataset() -> Result<CleanedDataset> {
        Ok(CleanedDataset {
            raw: DataFrame::empty(),
            cleaned: DataFrame::empty(),
            summary: CleaningSummary::default(),
        })
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
    }

    #[test]
    fn test_identical_bytes_hit_the_cache() {
        let mut cache = DatasetCache::new(4);
        let calls = Cell::new(0);

        let first = cache
            .get_or_clean(b"a,b\n1,2\n", || {
                calls.set(calls.get() + 1);
                dataset()
            })
            .unwrap();
        let second = cache
            .get_or_clean(b"a,b\n1,2\n", || {
                calls.set(calls.get() + 1);
                dataset()
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(!first.hit);
        assert!(second.hit);
        assert_eq!(first.key, second.key);
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut cache = DatasetCache::new(2);

        cache.get_or_clean(b"one", dataset).unwrap();
        cache.get_or_clean(b"two", dataset).unwrap();
        cache.get_or_clean(b"three", dataset).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(b"one"));
        assert!(cache.contains(b"two"));
        assert!(cache.contains(b"three"));
    }

    #[test]
    fn test_failed_clean_is_not_cached() {
        let mut cache = DatasetCache::new(2);

        let result = cache.get_or_clean(b"broken", || Err(anyhow!("missing required column")));

        assert!(result.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 1);
    }
}

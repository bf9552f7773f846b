//! AverageCache - in-memory memoisation of block averaging results.
//!
//! Entries are keyed by `(ImageId, BlockSize)` and never evicted; the cache
//! lives as long as the session that owns it. Each key holds a `OnceLock`, so
//! callers racing on the same key compute the grid at most once.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::pixels::{AveragedGrid, BlockSize};

/// Identifier of an image source (path, URL, or content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id from the pixel bytes themselves.
    /// Returns a 32-character hex string (first 16 bytes of SHA256).
    /// Identical content always produces the same id.
    pub fn from_content(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

type CacheKey = (ImageId, BlockSize);
type Slot = Arc<OnceLock<Arc<AveragedGrid>>>;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of times an averaging closure actually ran.
    pub computations: u64,
    pub entries: usize,
}

/// Memoised averaging results. Unbounded: no eviction policy.
#[derive(Debug, Default)]
pub struct AverageCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
}

impl AverageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache ready to be shared between a session and its callers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the averaged grid for `(image, block)`, if present.
    pub fn get(&self, image: &ImageId, block: BlockSize) -> Option<Arc<AveragedGrid>> {
        let slot = self.slots().get(&(image.clone(), block)).cloned();
        let found = slot.and_then(|s| s.get().cloned());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store a grid, replacing any previous entry for the key.
    pub fn put(&self, image: ImageId, block: BlockSize, grid: AveragedGrid) -> Arc<AveragedGrid> {
        let grid = Arc::new(grid);
        let slot = OnceLock::new();
        let _ = slot.set(Arc::clone(&grid));
        self.slots().insert((image, block), Arc::new(slot));
        grid
    }

    /// Return the cached grid, computing and storing it on a miss.
    ///
    /// Concurrent callers for the same key block on the first computation
    /// rather than running `compute` again.
    pub fn get_or_compute<F>(&self, image: ImageId, block: BlockSize, compute: F) -> Arc<AveragedGrid>
    where
        F: FnOnce() -> AveragedGrid,
    {
        let slot = {
            let mut slots = self.slots();
            Arc::clone(slots.entry((image.clone(), block)).or_default())
        };

        if let Some(grid) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Average cache hit: {} @ {}", image, block);
            return Arc::clone(grid);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let grid = slot.get_or_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            log::debug!("Average cache miss: {} @ {}, computing", image, block);
            Arc::new(compute())
        });
        Arc::clone(grid)
    }

    pub fn contains(&self, image: &ImageId, block: BlockSize) -> bool {
        self.slots()
            .get(&(image.clone(), block))
            .is_some_and(|s| s.get().is_some())
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.slots().values().filter(|s| s.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.slots().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::{average_blocks, Color, PixelGrid};

    fn block(s: u32) -> BlockSize {
        BlockSize::new(s).unwrap()
    }

    #[test]
    fn test_get_missing_is_none() {
        let cache = AverageCache::new();
        assert!(cache.get(&ImageId::new("a.png"), block(4)).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_then_get() {
        let cache = AverageCache::new();
        let grid = average_blocks(&PixelGrid::filled(4, 4, Color::WHITE), block(2));
        cache.put(ImageId::new("a.png"), block(2), grid.clone());

        let found = cache.get(&ImageId::new("a.png"), block(2)).unwrap();
        assert_eq!(*found, grid);
        assert!(cache.get(&ImageId::new("a.png"), block(3)).is_none());
        assert!(cache.get(&ImageId::new("b.png"), block(2)).is_none());
    }

    #[test]
    fn test_get_or_compute_runs_once() {
        let cache = AverageCache::new();
        let pixels = PixelGrid::filled(8, 8, Color::WHITE);
        let id = ImageId::new("img");

        let first = cache.get_or_compute(id.clone(), block(4), || average_blocks(&pixels, block(4)));
        let second = cache.get_or_compute(id, block(4), || panic!("should not recompute"));

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_image_id_from_content_is_stable() {
        let a = ImageId::from_content(&[1, 2, 3, 4]);
        let b = ImageId::from_content(&[1, 2, 3, 4]);
        let c = ImageId::from_content(&[4, 3, 2, 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }
}

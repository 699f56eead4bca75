//! Reloadable store handle for concurrent readers
//!
//! # Concurrency Model
//!
//! A [`SimilarityStore`] is immutable once built, so any number of threads can
//! query the same instance. `SharedStore` adds full replacement on top:
//!
//! - **Query**: `snapshot()` takes the read lock just long enough to clone an
//!   `Arc`. The query then runs lock-free against that snapshot.
//! - **Reload**: the new store is loaded and validated before the write lock
//!   is taken, so a failed load leaves the current store in place and readers
//!   never observe a half-built store.
//!
//! In-flight queries keep the snapshot they started with.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use morgan_core::format::FileError;
use morgan_core::SimilarityStore;

/// Thread-safe, swappable store handle
#[derive(Debug, Default)]
pub struct SharedStore {
    current: RwLock<Arc<SimilarityStore>>,
}

impl SharedStore {
    pub fn new(store: SimilarityStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// Open a `MORGANFPS` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        Ok(Self::new(SimilarityStore::open(path)?))
    }

    /// Current store. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<SimilarityStore> {
        self.current.read().clone()
    }

    /// Publish `store`, returning the one it replaced
    pub fn replace(&self, store: SimilarityStore) -> Arc<SimilarityStore> {
        let next_len = store.len();
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(store));
        tracing::info!(
            "Replaced fingerprint store ({} -> {} fingerprints)",
            previous.len(),
            next_len
        );
        previous
    }

    /// Load `path` and publish it. On error the current store stays.
    pub fn reload<P: AsRef<Path>>(&self, path: P) -> Result<Arc<SimilarityStore>, FileError> {
        let store = SimilarityStore::open(path)?;
        Ok(self.replace(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morgan_core::format::SaveOptions;
    use morgan_core::FingerprintBatch;
    use tempfile::tempdir;

    fn store_of(n: usize) -> SimilarityStore {
        let fps: Vec<String> = (0..n)
            .map(|i| format!("{:02x}{}", i + 1, "0".repeat(510)))
            .collect();
        SimilarityStore::from_batch(&FingerprintBatch::new(fps)).unwrap()
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let shared = SharedStore::new(store_of(2));
        let before = shared.snapshot();
        let previous = shared.replace(store_of(5));

        assert_eq!(before.len(), 2);
        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(shared.snapshot().len(), 5);
    }

    #[test]
    fn test_failed_reload_keeps_store() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.fps");
        std::fs::write(&bad, b"NOTMORGAN\x03\0\0\0\0\0\0\0").unwrap();

        let shared = SharedStore::new(store_of(3));
        assert!(matches!(
            shared.reload(&bad),
            Err(FileError::InvalidMagic { .. })
        ));
        assert_eq!(shared.snapshot().len(), 3);
    }

    #[test]
    fn test_reload_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("next.fps");
        store_of(4).save(&path, &SaveOptions::default()).unwrap();

        let shared = SharedStore::default();
        assert!(shared.snapshot().is_empty());
        shared.reload(&path).unwrap();
        assert_eq!(shared.snapshot().names(), &[1, 2, 3, 4]);
    }
}

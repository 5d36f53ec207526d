// src/editor/locks.rs
// Per-path locking for the edit engine

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Registry of one mutex per path string. An entry lives only while some
/// caller holds or waits on it; `release` drops it afterwards, so the map
/// never outgrows the set of paths currently being edited.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, path: &Path) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(path) {
            return lock.clone();
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `path`; released when the guard drops
    pub async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        self.entry(path).await.lock_owned().await
    }

    /// Forget the entry for `path` if nobody holds or waits on it.
    /// Returns whether it was removed.
    pub async fn release(&self, path: &Path) -> bool {
        let mut locks = self.locks.write().await;
        // The map's own reference is the only one left
        let idle = locks
            .get(path)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(path);
        }
        idle
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

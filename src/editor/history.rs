// src/editor/history.rs
// Bounded per-file undo history

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

/// Default number of snapshots kept per file
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Per-path stacks of whole-file snapshots, most recent last.
///
/// Each stack holds at most `capacity` snapshots; pushing onto a full stack
/// evicts the oldest one.
#[derive(Debug)]
pub struct HistoryLedger {
    capacity: usize,
    stacks: Mutex<HashMap<PathBuf, VecDeque<String>>>,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLedger {
    /// Create a ledger. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            stacks: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a snapshot for `path`. Returns the evicted oldest snapshot, if any.
    pub async fn push(&self, path: &Path, snapshot: String) -> Option<String> {
        let mut stacks = self.stacks.lock().await;
        let stack = stacks.entry(path.to_path_buf()).or_default();
        stack.push_back(snapshot);

        let evicted = if stack.len() > self.capacity {
            stack.pop_front()
        } else {
            None
        };

        debug!(path = %path.display(), depth = stack.len(), evicted = evicted.is_some(), "History push");
        evicted
    }

    /// Remove and return the most recent snapshot for `path`
    pub async fn pop(&self, path: &Path) -> Option<String> {
        let mut stacks = self.stacks.lock().await;
        let stack = stacks.get_mut(path)?;
        let snapshot = stack.pop_back();

        if stack.is_empty() {
            stacks.remove(path);
        }
        snapshot
    }

    /// Undo the last `push` for `path`, putting back what it evicted
    pub async fn retract(&self, path: &Path, evicted: Option<String>) {
        let mut stacks = self.stacks.lock().await;
        let Some(stack) = stacks.get_mut(path) else {
            return;
        };

        stack.pop_back();
        if let Some(oldest) = evicted {
            stack.push_front(oldest);
        }
        if stack.is_empty() {
            stacks.remove(path);
        }
    }

    /// Put a popped snapshot back on top of the stack
    pub async fn restore(&self, path: &Path, snapshot: String) {
        let mut stacks = self.stacks.lock().await;
        let stack = stacks.entry(path.to_path_buf()).or_default();
        stack.push_back(snapshot);
        if stack.len() > self.capacity {
            stack.pop_front();
        }
    }

    /// Number of snapshots held for `path`
    pub async fn depth(&self, path: &Path) -> usize {
        self.stacks
            .lock()
            .await
            .get(path)
            .map_or(0, VecDeque::len)
    }
}

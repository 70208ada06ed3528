//! Memoization of completed parses
//!
//! Entries are keyed by the raw text (length plus content hash), goal,
//! duration and parse mode. Only final-mode parses are stored. When full,
//! the oldest inserted entry is evicted.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use tracing::debug;

use crate::plan::{ParseMode, Plan};

/// Default number of cached plans
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Composite cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text_len: usize,
    text_hash: u64,
    goal: String,
    duration_days: Option<u32>,
    streaming: bool,
}

impl CacheKey {
    /// Build a key for a parse of `text`
    pub fn new(text: &str, goal: &str, duration_days: Option<u32>, mode: ParseMode) -> Self {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        Self {
            text_len: text.len(),
            text_hash: hasher.finish(),
            goal: goal.to_string(),
            duration_days,
            streaming: mode.is_streaming(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Plan>,
    order: VecDeque<CacheKey>,
}

/// Bounded, insertion-ordered plan cache shared across generations
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` plans
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a cached plan
    pub fn get(&self, key: &CacheKey) -> Option<Plan> {
        let inner = self.lock();
        inner.entries.get(key).cloned()
    }

    /// Store a plan, evicting the oldest entry when full
    ///
    /// Streaming-mode keys are never stored. Re-inserting an existing key
    /// replaces the plan without changing its eviction position.
    pub fn insert(&self, key: CacheKey, plan: Plan) {
        if key.streaming || self.capacity == 0 {
            return;
        }

        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), plan).is_some() {
            return;
        }
        inner.order.push_back(key);

        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                debug!(goal = %oldest.goal, "Evicted cached plan");
            }
        }
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // Map and queue are updated together; a poisoned lock is still consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

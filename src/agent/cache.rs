//! Query cache
//!
//! Maps normalized queries to final answers. Bounded by entry count with
//! first-in-first-out eviction. Shared between concurrent requests, so all
//! access goes through one lock that is never held across an await.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

/// Normalize a query into its cache key
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// A cached answer
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
}

/// Bounded FIFO cache of final answers
#[derive(Debug)]
pub struct QueryCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
}

impl QueryCache {
    /// Create a cache holding at most `max_entries` answers
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries: max_entries.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // The guarded data stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached answer for `query`, if any
    pub fn get(&self, query: &str) -> Option<String> {
        self.entry(query).map(|entry| entry.answer)
    }

    /// Full cache entry for `query`, if any
    pub fn entry(&self, query: &str) -> Option<CacheEntry> {
        let key = normalize_query(query);
        self.lock().entries.get(&key).cloned()
    }

    /// Store an answer
    ///
    /// Overwriting an existing key replaces only the answer; the entry keeps
    /// its eviction position and `created_at`.
    pub fn put(&self, query: &str, answer: impl Into<String>) {
        let key = normalize_query(query);
        let answer = answer.into();

        let mut inner = self.lock();
        if let Some(existing) = inner.entries.get_mut(&key) {
            existing.answer = answer;
            return;
        }

        while inner.entries.len() >= self.max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                answer,
                created_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

//! Expiring store for generated suggestions.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedSuggestion {
    text: String,
    inserted_at: DateTime<Utc>,
    seq: u64,
}

/// Suggestion text keyed by [`super::cache_key`].
///
/// Entries expire `ttl` after insertion. When more than `max_entries` are
/// live, the oldest insertions are evicted first.
pub struct SuggestionCache {
    entries: DashMap<String, CachedSuggestion>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    seq: AtomicU64,
}

impl SuggestionCache {
    pub fn new(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            clock,
            seq: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let (text, inserted_at) = {
            let entry = self.entries.get(key)?;
            (entry.text.clone(), entry.inserted_at)
        };
        if now - inserted_at < self.ttl {
            Some(text)
        } else {
            self.entries
                .remove_if(key, |_, e| e.inserted_at == inserted_at);
            None
        }
    }

    pub fn insert(&self, key: String, text: String) {
        let entry = CachedSuggestion {
            text,
            inserted_at: self.clock.now(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        self.entries.insert(key, entry);

        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| (e.inserted_at, e.seq))
                .map(|e| e.key().clone());
            match oldest {
                Some(key) => {
                    tracing::debug!(key = %key, "evicting oldest suggestion");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.inserted_at < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

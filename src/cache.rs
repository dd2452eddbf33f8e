//! Process-lifetime cache of ranked search results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{CandidateRecord, ContentType};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Entry budget enforced by cleanup.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Minimum spacing between opportunistic cleanups, in seconds.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    1800
}

fn default_max_entries() -> usize {
    1000
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<CandidateRecord>,
    inserted_at: Instant,
    sequence: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_sequence: u64,
    last_cleanup: Option<Instant>,
}

/// TTL- and size-bounded cache keyed by `(query, content type)`.
///
/// Concurrent writers to the same key race; the last write wins.
pub struct ResponseCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
}

impl ResponseCache {
    /// Creates a cache on the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache on a custom clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Builds the key for a query and content type.
    pub fn key(query: &str, content_type: ContentType) -> String {
        format!("{}:{}", query, content_type)
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl()
    }

    /// Returns the cached records, dropping the entry if it has expired.
    pub async fn get(&self, query: &str, content_type: ContentType) -> Option<Vec<CandidateRecord>> {
        let key = Self::key(query, content_type);
        let now = self.clock.now();

        {
            let state = self.state.read().await;
            match state.entries.get(&key) {
                None => return None,
                Some(entry) if !self.is_expired(entry, now) => {
                    debug!("Using cached results for: \"{}\"", query);
                    return Some(entry.records.clone());
                }
                Some(_) => {}
            }
        }

        let mut state = self.state.write().await;
        if state
            .entries
            .get(&key)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            state.entries.remove(&key);
        }
        None
    }

    /// Stores records for a query, replacing any previous entry.
    pub async fn insert(&self, query: &str, content_type: ContentType, records: Vec<CandidateRecord>) {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.insert(
            Self::key(query, content_type),
            CacheEntry {
                records,
                inserted_at: now,
                sequence,
            },
        );
    }

    /// Runs [`cleanup`](Self::cleanup) if the cleanup interval has elapsed.
    ///
    /// Returns whether a sweep ran. The first call always sweeps.
    pub async fn maybe_cleanup(&self) -> bool {
        let now = self.clock.now();
        let interval = Duration::from_secs(self.config.cleanup_interval_secs);
        {
            let state = self.state.read().await;
            if let Some(last) = state.last_cleanup {
                if now.saturating_duration_since(last) <= interval {
                    return false;
                }
            }
        }
        self.cleanup().await;
        true
    }

    /// Drops expired entries, then the oldest entries beyond `max_entries`.
    pub async fn cleanup(&self) {
        let now = self.clock.now();
        let mut state = self.state.write().await;

        let before = state.entries.len();
        state.entries.retain(|_, entry| !self.is_expired(entry, now));

        let excess = state.entries.len().saturating_sub(self.config.max_entries);
        if excess > 0 {
            let mut by_age: Vec<(Instant, u64, String)> = state
                .entries
                .iter()
                .map(|(key, entry)| (entry.inserted_at, entry.sequence, key.clone()))
                .collect();
            by_age.sort();
            for (_, _, key) in by_age.into_iter().take(excess) {
                state.entries.remove(&key);
            }
        }

        state.last_cleanup = Some(now);
        debug!(
            "Cache cleanup: kept {} of {} entries",
            state.entries.len(),
            before
        );
    }

    /// Returns occupancy statistics.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.state.read().await.entries.len(),
            max_entries: self.config.max_entries,
            ttl_secs: self.config.ttl_secs,
        }
    }

    /// Lists the current keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.read().await.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

//! Short-lived cache for aggregate reports.
//!
//! Entries are keyed by user and date window. Any trade write for a user drops
//! every entry for that user, so a hit is never older than the last write.
//! Readers take a [`Generation`] before loading and hand it back on insert; a
//! result computed before an invalidation is discarded instead of stored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::models::DateWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: i64,
    pub window: DateWindow,
}

impl CacheKey {
    pub fn new(user_id: i64, window: DateWindow) -> Self {
        Self { user_id, window }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Snapshot of the invalidation counters for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    user: u64,
}

struct CacheState<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    /// Bumped by `clear`.
    epoch: u64,
    /// Bumped per user by `invalidate_user`.
    users: HashMap<i64, u64>,
}

impl<V> CacheState<V> {
    fn generation(&self, user_id: i64) -> Generation {
        Generation {
            epoch: self.epoch,
            user: self.users.get(&user_id).copied().unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct SummaryCache<V> {
    name: &'static str,
    state: Arc<RwLock<CacheState<V>>>,
    ttl_seconds: Arc<AtomicU64>,
}

impl<V: Clone> SummaryCache<V> {
    pub fn new(name: &'static str, ttl_seconds: u64) -> Self {
        Self {
            name,
            state: Arc::new(RwLock::new(CacheState {
                entries: HashMap::new(),
                epoch: 0,
                users: HashMap::new(),
            })),
            ttl_seconds: Arc::new(AtomicU64::new(ttl_seconds)),
        }
    }

    fn ttl(&self) -> Option<Duration> {
        match self.ttl_seconds.load(Ordering::Relaxed) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// 0 disables caching and drops what is stored.
    pub async fn set_ttl(&self, ttl_seconds: u64) {
        self.ttl_seconds.store(ttl_seconds, Ordering::Relaxed);
        if ttl_seconds == 0 {
            self.clear().await;
        }
    }

    /// Take before loading the data a later `insert` will store.
    pub async fn generation(&self, user_id: i64) -> Generation {
        self.state.read().await.generation(user_id)
    }

    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let ttl = self.ttl()?;
        let state = self.state.read().await;
        let entry = state.entries.get(key)?;
        if entry.stored_at.elapsed() >= ttl {
            return None;
        }
        log::debug!("{} cache hit for user {} ({:?})", self.name, key.user_id, key.window);
        Some(entry.value.clone())
    }

    /// Stores `value` unless the user was invalidated after `seen` was taken.
    pub async fn insert(&self, key: CacheKey, value: V, seen: Generation) {
        let Some(ttl) = self.ttl() else {
            return;
        };
        let mut state = self.state.write().await;
        if state.generation(key.user_id) != seen {
            log::debug!("{} cache skipped stale result for user {}", self.name, key.user_id);
            return;
        }
        state.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        state.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.entries.clear();
    }

    pub async fn invalidate_user(&self, user_id: i64) {
        let mut state = self.state.write().await;
        *state.users.entry(user_id).or_default() += 1;
        let before = state.entries.len();
        state.entries.retain(|key, _| key.user_id != user_id);
        let dropped = before - state.entries.len();
        if dropped > 0 {
            log::debug!("{} cache dropped {} entries for user {}", self.name, dropped, user_id);
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

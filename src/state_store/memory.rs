// ABOUTME: In-process state store with a capacity bound, per-entry TTL and background sweep
// ABOUTME: Consume is check-expiry-and-remove under one mutex, making it atomic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{StateKey, StateStore};
use crate::config::state_store::StateStoreConfig;
use crate::errors::{AppError, AppResult};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Stored value with its deadline
#[derive(Debug, Clone)]
struct StateEntry {
    value: String,
    expires_at: Instant,
}

impl StateEntry {
    fn new(value: String, ttl: Duration, now: Instant) -> AppResult<Self> {
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| AppError::internal(format!("State TTL of {ttl:?} is out of range")))?;
        Ok(Self { value, expires_at })
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

type SharedEntries = Arc<Mutex<LruCache<String, StateEntry>>>;

/// In-process state store
///
/// Entries live in an `LruCache` bounded by `max_entries` behind a single
/// `tokio::sync::Mutex`. Live entries are never evicted: a save into a full
/// store purges expired entries and, if the store is still full, fails with
/// a storage error. A sweeper task purges expired entries on a fixed
/// interval until [`InMemoryStateStore::shutdown`] is called or the store is
/// dropped. Suitable for single-instance deployments only.
pub struct InMemoryStateStore {
    entries: SharedEntries,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl InMemoryStateStore {
    /// Capacity used when configuration specifies zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create the store and, if enabled, start the background sweeper
    ///
    /// Must be called from within a Tokio runtime when background cleanup is enabled.
    #[must_use]
    pub fn new(config: &StateStoreConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        let entries: SharedEntries = Arc::new(Mutex::new(LruCache::new(capacity)));

        let shutdown_tx = if config.enable_background_cleanup {
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
            Self::spawn_sweeper(entries.clone(), config.cleanup_interval(), shutdown_rx);
            Some(shutdown_tx)
        } else {
            None
        };

        Self {
            entries,
            shutdown_tx,
        }
    }

    fn spawn_sweeper(entries: SharedEntries, interval: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::purge(&entries).await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("State store sweeper received shutdown signal");
                        break;
                    }
                }
            }
        });
    }

    async fn purge(entries: &SharedEntries) -> usize {
        let mut guard = entries.lock().await;
        let purged = Self::purge_locked(&mut guard, Instant::now());
        drop(guard);

        if purged > 0 {
            debug!("Purged {purged} expired state store entries");
        }
        purged
    }

    fn purge_locked(entries: &mut LruCache<String, StateEntry>, now: Instant) -> usize {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Remove every expired entry now, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        Self::purge(&self.entries).await
    }

    /// Number of entries physically held (including expired, not yet purged)
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Stop the background sweeper
    pub fn shutdown(&self) {
        if let Some(tx) = &self.shutdown_tx {
            if let Err(e) = tx.try_send(()) {
                debug!(error = ?e, "State store shutdown signal not delivered (sweeper already stopped)");
            }
        }
    }
}

#[async_trait::async_trait]
impl StateStore for InMemoryStateStore {
    async fn save(&self, key: &StateKey, value: String, ttl: Duration) -> AppResult<()> {
        let key = key.to_string();
        let now = Instant::now();
        let entry = StateEntry::new(value, ttl, now)?;

        let mut guard = self.entries.lock().await;
        if !guard.contains(key.as_str()) && guard.len() >= guard.cap().get() {
            Self::purge_locked(&mut guard, now);
            if guard.len() >= guard.cap().get() {
                drop(guard);
                warn!("State store at capacity; rejecting new entry");
                return Err(AppError::storage("State store at capacity"));
            }
        }
        guard.put(key, entry);
        Ok(())
    }

    async fn consume(&self, key: &StateKey) -> AppResult<Option<String>> {
        let key = key.to_string();
        let mut guard = self.entries.lock().await;
        let entry = guard.pop(key.as_str());
        drop(guard);

        Ok(entry
            .filter(|entry| !entry.is_expired_at(Instant::now()))
            .map(|entry| entry.value))
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl Drop for InMemoryStateStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(max_entries: usize) -> InMemoryStateStore {
        InMemoryStateStore::new(&StateStoreConfig {
            max_entries,
            enable_background_cleanup: false,
            ..StateStoreConfig::default()
        })
    }

    #[tokio::test]
    async fn test_consume_removes_entry() {
        let store = store(10);
        let key = StateKey::FlowState("s1".into());
        store
            .save(&key, "payload".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.consume(&key).await.unwrap().as_deref(), Some("payload"));
        assert_eq!(store.consume(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_key() {
        let store = store(10);
        let key = StateKey::OneTimeCode("c1".into());
        store.save(&key, "first".into(), Duration::from_secs(60)).await.unwrap();
        store.save(&key, "second".into(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.consume(&key).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent_before_purge() {
        let store = store(10);
        let key = StateKey::FlowState("short".into());
        store
            .save(&key, "payload".into(), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.consume(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_expired_only_removes_expired() {
        let store = store(10);
        store
            .save(&StateKey::FlowState("old".into()), "a".into(), Duration::from_millis(10))
            .await
            .unwrap();
        store
            .save(&StateKey::FlowState("new".into()), "b".into(), Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_full_store_rejects_instead_of_evicting_live_entries() {
        let store = store(2);
        for token in ["a", "b"] {
            store
                .save(&StateKey::FlowState(token.into()), token.into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        let err = store
            .save(&StateKey::FlowState("c".into()), "c".into(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::StorageError);

        assert_eq!(store.consume(&StateKey::FlowState("a".into())).await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.consume(&StateKey::FlowState("b".into())).await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_full_store_makes_room_by_purging_expired() {
        let store = store(2);
        store
            .save(&StateKey::FlowState("old".into()), "a".into(), Duration::from_millis(10))
            .await
            .unwrap();
        store
            .save(&StateKey::FlowState("live".into()), "b".into(), Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        store
            .save(&StateKey::FlowState("new".into()), "c".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.consume(&StateKey::FlowState("live".into())).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_store_still_overwrites_existing_key() {
        let store = store(1);
        let key = StateKey::OneTimeCode("only".into());
        store.save(&key, "first".into(), Duration::from_secs(60)).await.unwrap();
        store.save(&key, "second".into(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.consume(&key).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_an_error() {
        let store = store(2);
        let result = store
            .save(&StateKey::FlowState("forever".into()), "x".into(), Duration::MAX)
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_background_sweeper_purges() {
        let store = InMemoryStateStore::new(&StateStoreConfig {
            max_entries: 10,
            cleanup_interval_secs: 1,
            enable_background_cleanup: true,
            ..StateStoreConfig::default()
        });
        store
            .save(&StateKey::FlowState("gone".into()), "x".into(), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1_300)).await;
        assert!(store.is_empty().await);
        store.shutdown();
    }
}

use chrono::{DateTime, TimeDelta, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use super::clock::{Clock, SystemClock};

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// In-memory cache whose entries expire a fixed time after insertion
///
/// Expiry is checked lazily on every read: an entry at or past its deadline is
/// reported as absent and dropped. Reads never extend a deadline. A background
/// sweeper (see [`TtlCache::spawn_sweeper`]) reclaims entries that are never
/// read again.
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
        }
    }
}

/// Handle for stopping the background sweeper
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper task to stop and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache sweeper task panicked");
        }
        tracing::info!("Cache sweeper shut down");
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Creates a cache backed by the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl,
        }
    }

    /// Returns the value stored under `key` if it has not expired
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired. Re-check under the write lock, a fresh insert may have landed.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    /// Stores `value` under `key` using the cache's configured TTL
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.ttl).await;
    }

    /// Stores `value` under `key`, replacing any previous entry
    pub async fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = deadline(self.clock.now(), ttl);
        self.entries
            .write()
            .await
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Number of stored entries, including expired ones not yet purged
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Removes every expired entry and returns how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Spawns a task that purges expired entries every `interval`
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let cache = self.clone();
        let task = tokio::spawn(async move {
            cache.sweeper_task(interval, shutdown_rx).await;
        });

        SweeperHandle { shutdown_tx, task }
    }

    async fn sweeper_task(self, interval: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(interval_secs = interval.as_secs(), "Cache sweeper task started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.purge_expired().await;
                    if purged > 0 {
                        let remaining = self.entry_count().await;
                        tracing::debug!(purged, remaining, "Purged expired cache entries");
                    }
                }
                // Also fires when the handle is dropped
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache sweeper task stopped");
                    break;
                }
            }
        }
    }
}

/// Absolute expiry time; saturates instead of overflowing for huge TTLs
fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use chrono::TimeZone;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn manual_cache(ttl: Duration) -> (TtlCache<String>, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = TtlCache::with_clock(ttl, clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _clock) = manual_cache(DAY);
        assert_eq!(cache.get("nonexistent").await, None);
    }

    #[tokio::test]
    async fn test_entry_present_just_before_ttl() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("해리포터", "cached".to_string()).await;

        clock.advance(TimeDelta::hours(24) - TimeDelta::milliseconds(1));

        assert_eq!(cache.get("해리포터").await, Some("cached".to_string()));
    }

    #[tokio::test]
    async fn test_entry_absent_just_after_ttl() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("해리포터", "cached".to_string()).await;

        clock.advance(TimeDelta::hours(24) + TimeDelta::milliseconds(1));

        assert_eq!(cache.get("해리포터").await, None);
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_entry_absent_exactly_at_deadline() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("dune", "cached".to_string()).await;

        clock.advance(TimeDelta::hours(24));

        assert_eq!(cache.get("dune").await, None);
    }

    #[tokio::test]
    async fn test_read_does_not_refresh_ttl() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("dune", "cached".to_string()).await;

        clock.advance(TimeDelta::hours(23));
        assert!(cache.get("dune").await.is_some());

        clock.advance(TimeDelta::hours(2));
        assert_eq!(cache.get("dune").await, None);
    }

    #[tokio::test]
    async fn test_keys_are_verbatim() {
        let (cache, _clock) = manual_cache(DAY);
        cache.insert("Dune", "upper".to_string()).await;

        assert_eq!(cache.get("dune").await, None);
        assert_eq!(cache.get("Dune ").await, None);
        assert_eq!(cache.get("Dune").await, Some("upper".to_string()));
    }

    #[tokio::test]
    async fn test_insert_replaces_existing_entry() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("dune", "first".to_string()).await;
        clock.advance(TimeDelta::hours(12));
        cache.insert("dune", "second".to_string()).await;

        clock.advance(TimeDelta::hours(20));

        assert_eq!(cache.get("dune").await, Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_insert_with_custom_ttl() {
        let (cache, clock) = manual_cache(DAY);
        cache
            .insert_with_ttl("short", "value".to_string(), Duration::from_secs(60))
            .await;

        clock.advance(TimeDelta::seconds(61));

        assert_eq!(cache.get("short").await, None);
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let (cache, clock) = manual_cache(Duration::MAX);
        cache.insert("forever", "value".to_string()).await;

        clock.advance(TimeDelta::days(365 * 100));

        assert_eq!(cache.get("forever").await, Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_purge_expired_only_drops_expired() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("old", "a".to_string()).await;
        clock.advance(TimeDelta::hours(20));
        cache.insert("new", "b".to_string()).await;
        clock.advance(TimeDelta::hours(5));

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.entry_count().await, 1);
        assert_eq!(cache.get("new").await, Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_sweeper_purges_in_background() {
        let (cache, clock) = manual_cache(DAY);
        cache.insert("stale", "a".to_string()).await;
        clock.advance(TimeDelta::hours(25));

        let handle = cache.spawn_sweeper(Duration::from_millis(10));

        // Give the background task time to tick
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.entry_count().await, 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_graceful_shutdown() {
        let (cache, clock) = manual_cache(DAY);
        let handle = cache.spawn_sweeper(Duration::from_millis(10));

        handle.shutdown().await;

        // No sweeps after shutdown
        cache.insert("stale", "a".to_string()).await;
        clock.advance(TimeDelta::hours(25));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.entry_count().await, 1);
    }
}

//! The Expiring Map
//!
//! [`ExpiringMap`] ties the pieces together: a [`Store`] for the entries, the
//! default TTL from [`MapConfig`], and the [`Reaper`] that reclaims expired
//! entries in the background.
//!
//! Dropping the map stops its reaper. Use [`ExpiringMap::shutdown`] to also
//! wait for the background task to finish.

use crate::config::MapConfig;
use crate::error::Result;
use crate::storage::{Reaper, ReaperState, Store, StoreStats};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A concurrent map whose entries expire after an optional time-to-live.
///
/// Expired entries are never visible to readers, whether or not the
/// reaper has physically removed them yet.
///
/// # Thread Safety
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// threads and tasks. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use ttlmap::{ExpiringMap, MapConfig, MapError};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let map = ExpiringMap::with_config(
///     MapConfig::default().with_sweep_interval(Duration::from_millis(100)),
/// );
///
/// map.set("key1", "value1", Some(Duration::from_millis(50)));
/// map.set("key2", "value2", None);
/// assert_eq!(map.get(&"key1"), Ok("value1"));
///
/// tokio::time::sleep(Duration::from_millis(60)).await;
///
/// assert_eq!(map.get(&"key1"), Err(MapError::KeyNotFound));
/// assert!(map.contains(&"key2"));
/// assert_eq!(map.len(), 1);
/// # }
/// ```
pub struct ExpiringMap<K, V> {
    store: Arc<Store<K, V>>,

    /// TTL used by `set` when the caller passes none
    default_ttl: Option<Duration>,

    /// Background sweeper, if sweeping is enabled
    reaper: Option<Reaper>,
}

impl<K, V> std::fmt::Debug for ExpiringMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringMap")
            .field("store", &self.store)
            .field("default_ttl", &self.default_ttl)
            .field("reaper", &self.reaper_state())
            .finish()
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a map with the process-wide defaults.
    ///
    /// See [`install_global_defaults`](crate::config::install_global_defaults).
    pub fn new() -> Self {
        Self::with_config(MapConfig::global())
    }

    /// Creates a map with the given configuration.
    ///
    /// With a sweep interval configured, the reaper is spawned on the current
    /// Tokio runtime. Outside a runtime the map runs without a reaper and
    /// relies on lazy expiry alone.
    pub fn with_config(config: MapConfig) -> Self {
        let store = Arc::new(Store::new());

        let reaper = config.effective_sweep_interval().and_then(|interval| {
            if tokio::runtime::Handle::try_current().is_err() {
                warn!("No Tokio runtime available, expired entries are only removed on access");
                return None;
            }
            Some(Reaper::start(&store, interval))
        });

        Self {
            store,
            default_ttl: config.default_ttl,
            reaper,
        }
    }
}

impl<K, V> Default for ExpiringMap<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ExpiringMap<K, V> {
    /// The TTL applied when `set` is called without one.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Reaper state, or `None` if this map never had a reaper.
    pub fn reaper_state(&self) -> Option<ReaperState> {
        self.reaper.as_ref().map(Reaper::state)
    }

    /// Stops background sweeping. Lazy expiry keeps working.
    pub fn stop_reaper(&self) {
        if let Some(reaper) = &self.reaper {
            reaper.stop();
        }
    }

    /// Stops the reaper and waits for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.shutdown().await;
        }
    }

    /// Number of live entries. This is a full scan.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Physical number of stored entries, including expired ones the
    /// reaper has not collected yet.
    pub fn raw_len(&self) -> usize {
        self.store.raw_len()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.store.clear()
    }

    /// Runs one sweep now, returning how many entries were removed.
    pub fn purge_expired(&self) -> u64 {
        self.store.purge_expired()
    }

    /// Returns operation statistics.
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    fn resolve_ttl(&self, ttl: Option<Duration>) -> Option<Duration> {
        ttl.or(self.default_ttl)
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
{
    /// Sets a key, replacing any existing entry.
    ///
    /// With `ttl` of `None`, the map's default TTL applies; without one the
    /// entry never expires.
    ///
    /// # Returns
    ///
    /// Returns `true` if no live entry existed before.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) -> bool {
        self.store.set(key, value, self.resolve_ttl(ttl))
    }

    /// Sets a key that never expires, regardless of the default TTL.
    pub fn set_persistent(&self, key: K, value: V) -> bool {
        self.store.set(key, value, None)
    }

    /// Deletes a key. Deleting an absent key is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        self.store.delete(key)
    }

    /// Checks if a key exists and is not expired.
    pub fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Gives a live key a new deadline `ttl` from now.
    pub fn expire(&self, key: &K, ttl: Duration) -> bool {
        self.store.expire(key, ttl)
    }

    /// Makes a live key persistent.
    pub fn persist(&self, key: &K) -> bool {
        self.store.persist(key)
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Gets the value for a key.
    ///
    /// Returns [`MapError::KeyNotFound`](crate::MapError::KeyNotFound) if the
    /// key doesn't exist or has expired.
    pub fn get(&self, key: &K) -> Result<V> {
        self.store.get(key)
    }

    /// Gets the value for a key, or `default` if it is absent or expired.
    pub fn get_or(&self, key: &K, default: V) -> V {
        self.store.get_or(key, default)
    }

    /// Remaining lifetime of a live key; `Ok(None)` if it never expires.
    pub fn ttl(&self, key: &K) -> Result<Option<Duration>> {
        self.store.ttl(key)
    }

    /// Deletes a key and returns its value if it was live.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.store.remove(key)
    }

    /// Sets a key only if no live entry exists for it.
    pub fn set_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> bool {
        self.store.set_if_absent(key, value, self.resolve_ttl(ttl))
    }

    /// Returns the live value for `key`, inserting `make()` first if needed.
    pub fn get_or_insert_with<F>(&self, key: K, ttl: Option<Duration>, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.store.get_or_insert_with(key, self.resolve_ttl(ttl), make)
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Snapshot of live keys.
    pub fn keys(&self) -> Vec<K> {
        self.store.keys()
    }

    /// Snapshot of live values.
    pub fn values(&self) -> Vec<V> {
        self.store.values()
    }

    /// Snapshot of live key/value pairs.
    pub fn items(&self) -> Vec<(K, V)> {
        self.store.items()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    fn lazy_only() -> MapConfig {
        MapConfig::default().without_sweeping()
    }

    #[test]
    fn test_default_ttl_applies() {
        let map = ExpiringMap::with_config(lazy_only().with_default_ttl(Duration::from_millis(20)));

        map.set("defaulted", 1, None);
        map.set("explicit", 2, Some(Duration::from_secs(60)));
        map.set_persistent("forever", 3);

        assert!(map.ttl(&"defaulted").unwrap().is_some());
        assert_eq!(map.ttl(&"forever"), Ok(None));

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(map.get(&"defaulted"), Err(MapError::KeyNotFound));
        assert_eq!(map.get(&"explicit"), Ok(2));
        assert_eq!(map.get(&"forever"), Ok(3));
    }

    #[test]
    fn test_huge_default_ttl_never_expires() {
        let map = ExpiringMap::with_config(lazy_only().with_default_ttl(Duration::MAX));

        assert!(map.set("key", "value", None));
        assert!(map.set_if_absent("other", "value", None));
        assert_eq!(map.get(&"key"), Ok("value"));
        assert_eq!(map.ttl(&"other"), Ok(None));
    }

    #[test]
    fn test_set_if_absent_uses_default_ttl() {
        let map = ExpiringMap::with_config(lazy_only().with_default_ttl(Duration::from_millis(20)));

        assert!(map.set_if_absent("key", "first", None));
        assert!(!map.set_if_absent("key", "second", None));

        std::thread::sleep(Duration::from_millis(40));
        assert!(map.set_if_absent("key", "third", None));
        assert_eq!(map.get(&"key"), Ok("third"));
    }

    #[test]
    fn test_no_reaper_when_disabled() {
        let map: ExpiringMap<String, String> = ExpiringMap::with_config(lazy_only());
        assert_eq!(map.reaper_state(), None);

        let map: ExpiringMap<String, String> =
            ExpiringMap::with_config(MapConfig::default().with_sweep_interval(Duration::ZERO));
        assert_eq!(map.reaper_state(), None);
    }

    #[test]
    fn test_no_reaper_outside_runtime() {
        let map = ExpiringMap::with_config(MapConfig::default());
        assert_eq!(map.reaper_state(), None);

        // Lazy expiry still holds
        map.set("key", "value", Some(Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(30));
        assert!(!map.contains(&"key"));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_reaper_runs_under_block_on() {
        tokio_test::block_on(async {
            let map = ExpiringMap::with_config(
                MapConfig::default().with_sweep_interval(Duration::from_millis(10)),
            );
            map.set("key", "value", Some(Duration::from_millis(20)));
            assert_eq!(map.reaper_state(), Some(ReaperState::Running));

            tokio::time::sleep(Duration::from_millis(150)).await;
            assert_eq!(map.raw_len(), 0);
        });
    }

    #[tokio::test]
    async fn test_stop_reaper() {
        let map = ExpiringMap::with_config(
            MapConfig::default().with_sweep_interval(Duration::from_millis(10)),
        );
        assert_eq!(map.reaper_state(), Some(ReaperState::Running));

        map.stop_reaper();
        assert_eq!(map.reaper_state(), Some(ReaperState::Stopped));

        map.set("key", "value", Some(Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(map.raw_len(), 1);
        assert_eq!(map.len(), 0);
        assert_eq!(map.purge_expired(), 1);
        assert_eq!(map.raw_len(), 0);
    }

    #[tokio::test]
    async fn test_drop_stops_reaper_task() {
        let mut map: ExpiringMap<u32, u32> = ExpiringMap::with_config(
            MapConfig::default().with_sweep_interval(Duration::from_millis(10)),
        );
        let task = map
            .reaper
            .as_mut()
            .and_then(|reaper| reaper.task.take())
            .unwrap();

        // Hold the store so the task cannot exit just because it is gone
        let store = Arc::clone(&map.store);
        drop(map);

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reaper task should exit once the map is dropped")
            .unwrap();
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[tokio::test]
    async fn test_shutdown() {
        let map: ExpiringMap<u32, u32> = ExpiringMap::with_config(
            MapConfig::default().with_sweep_interval(Duration::from_millis(10)),
        );
        map.set(1, 1, None);

        tokio::time::timeout(Duration::from_secs(1), map.shutdown())
            .await
            .expect("shutdown should complete promptly");
    }
}

//! Thread-Safe Store with Expiry Support
//!
//! This module implements the store behind every [`ExpiringMap`]: a
//! `HashMap` of entries guarded by a single `RwLock`, where every entry
//! carries an optional deadline.
//!
//! ## Design Decisions
//!
//! 1. **One Guard**: Every operation, including the reaper's sweep, holds the
//!    same lock for its whole critical section. No caller ever sees a torn entry.
//! 2. **Lazy Expiry**: Reads compare the deadline against the current instant,
//!    so an expired entry is invisible whether or not it was physically removed.
//! 3. **Held-Guard Helpers**: Composite operations (such as `set_if_absent`)
//!    run private helpers against the guard they already hold instead of
//!    calling back into locking methods. `std::sync::RwLock` is not reentrant.
//! 4. **Scanned Length**: `len()` counts live entries under the guard on every
//!    call. There is no maintained counter to drift out of sync with the reaper.
//!
//! ## Liveness
//!
//! ```text
//!   set(k, v, ttl)            deadline = now + ttl
//!        │
//!        ▼
//!   ┌─────────┐   now >= deadline   ┌─────────┐   sweep / lazy removal
//!   │  Live   │ ──────────────────> │  Stale  │ ───────────────────────> gone
//!   └─────────┘                     └─────────┘
//!        │ delete                        │ delete
//!        ▼                               ▼
//!       gone                            gone
//! ```
//!
//! A stale entry and a missing entry are indistinguishable to every reader.
//!
//! [`ExpiringMap`]: crate::ExpiringMap

use crate::error::{MapError, Result};
use crate::storage::expiry::Sweep;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// A stored value with an optional deadline.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The actual value stored
    pub value: V,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
    /// When this entry was created
    pub created_at: Instant,
}

impl<V> Entry<V> {
    /// Creates a new entry without expiry.
    pub fn new(value: V) -> Self {
        Self {
            value,
            expires_at: None,
            created_at: Instant::now(),
        }
    }

    /// Creates a new entry that expires `ttl` from now.
    ///
    /// A deadline beyond what `Instant` can represent means the entry
    /// never expires.
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl),
            created_at: now,
        }
    }

    /// Creates an entry with an optional TTL.
    pub fn with_optional_ttl(value: V, ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => Self::with_ttl(value, ttl),
            None => Self::new(value),
        }
    }

    /// Checks if this entry is expired as of `now`.
    ///
    /// An entry is absent for any observation made at or after its deadline.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Remaining lifetime as of `now`. `None` if the entry never expires.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|exp| exp.saturating_duration_since(now))
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Total get operations (including `get_or` and `ttl` lookups)
    pub get_ops: u64,
    /// Total set operations that wrote an entry
    pub set_ops: u64,
    /// Total delete operations
    pub del_ops: u64,
    /// Stale entries removed by a reader
    pub lazily_expired: u64,
    /// Stale entries removed by a sweep
    pub reaped: u64,
}

/// The guarded map of entries.
///
/// `Store` is the Store and the Guard in one. It applies TTLs exactly as
/// given: default-TTL handling lives in [`ExpiringMap`](crate::ExpiringMap).
///
/// # Example
///
/// ```
/// use ttlmap::storage::Store;
/// use std::time::Duration;
///
/// let store = Store::new();
/// store.set("name", "Ariz", None);
/// assert_eq!(store.get(&"name"), Ok("Ariz"));
///
/// store.set("session", "token123", Some(Duration::from_secs(60)));
/// assert!(store.contains(&"session"));
/// ```
pub struct Store<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,

    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
    lazy_expired_count: AtomicU64,
    reaped_count: AtomicU64,
}

impl<K, V> std::fmt::Debug for Store<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("raw_len", &self.read().len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            lazy_expired_count: AtomicU64::new(0),
            reaped_count: AtomicU64::new(0),
        }
    }

    // Every critical section leaves the map consistent before user code can
    // run, so a poisoned guard still protects valid data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live entries, counted by a full scan under the guard.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.read()
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    /// Returns true if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical number of entries, stale ones included.
    pub fn raw_len(&self) -> usize {
        self.read().len()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Physically removes every expired entry.
    ///
    /// This is what the reaper runs on each wake. It holds the exclusive guard
    /// for exactly one O(n) pass.
    ///
    /// # Returns
    ///
    /// Returns the number of entries that were removed.
    pub fn purge_expired(&self) -> u64 {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = (before - entries.len()) as u64;
        if removed > 0 {
            self.reaped_count.fetch_add(removed, Ordering::Relaxed);
        }
        removed
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            lazily_expired: self.lazy_expired_count.load(Ordering::Relaxed),
            reaped: self.reaped_count.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash,
{
    /// Looks up a live entry in an already-held map.
    fn live_entry<'a>(
        entries: &'a HashMap<K, Entry<V>>,
        key: &K,
        now: Instant,
    ) -> Option<&'a Entry<V>> {
        entries.get(key).filter(|entry| !entry.is_expired_at(now))
    }

    /// Drops a stale entry for `key` from an already-held map.
    ///
    /// Returns true if a stale entry was found and removed.
    fn evict_if_stale(&self, entries: &mut HashMap<K, Entry<V>>, key: &K, now: Instant) -> bool {
        if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
            entries.remove(key);
            self.lazy_expired_count.fetch_add(1, Ordering::Relaxed);
            trace!("stale entry removed on access");
            true
        } else {
            false
        }
    }

    /// Inserts into an already-held map, fully replacing any prior entry.
    ///
    /// Returns true if no live entry existed for the key.
    fn insert_held(
        &self,
        entries: &mut HashMap<K, Entry<V>>,
        key: K,
        entry: Entry<V>,
        now: Instant,
    ) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);
        entries
            .insert(key, entry)
            .map_or(true, |prior| prior.is_expired_at(now))
    }

    /// Sets a key, replacing any existing entry (value and deadline).
    ///
    /// `ttl` of `None` means the entry never expires.
    ///
    /// # Returns
    ///
    /// Returns `true` if no live entry existed before, `false` if one was replaced.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) -> bool {
        let entry = Entry::with_optional_ttl(value, ttl);
        let mut entries = self.write();
        self.insert_held(&mut entries, key, entry, Instant::now())
    }

    /// Deletes a key, live or stale. Deleting an absent key is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        self.write()
            .remove(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Checks if a key exists and is not expired.
    pub fn contains(&self, key: &K) -> bool {
        Self::live_entry(&self.read(), key, Instant::now()).is_some()
    }

    /// Updates the deadline of a live key to `ttl` from now.
    ///
    /// # Returns
    ///
    /// Returns `true` if the deadline was set, `false` if the key doesn't exist.
    pub fn expire(&self, key: &K, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.write();
        if self.evict_if_stale(&mut entries, key, now) {
            return false;
        }
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = now.checked_add(ttl);
                true
            }
            None => false,
        }
    }

    /// Removes the deadline from a live key.
    ///
    /// # Returns
    ///
    /// Returns `true` if a deadline was removed, `false` if the key doesn't
    /// exist or never expired.
    pub fn persist(&self, key: &K) -> bool {
        let now = Instant::now();
        let mut entries = self.write();
        if self.evict_if_stale(&mut entries, key, now) {
            return false;
        }
        entries
            .get_mut(key)
            .and_then(|entry| entry.expires_at.take())
            .is_some()
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Gets the value for a key.
    ///
    /// Returns `MapError::KeyNotFound` if the key doesn't exist or has expired.
    /// An expired entry found here is removed on the way out.
    pub fn get(&self, key: &K) -> Result<V> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        // Fast path: shared guard for existing, live keys
        {
            let entries = self.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(entry.value.clone()),
                Some(_) => {}
                None => return Err(MapError::KeyNotFound),
            }
        }

        // Key exists but is expired - need the exclusive guard to remove it.
        // Another writer may have replaced it in between, so check again.
        let now = Instant::now();
        let mut entries = self.write();
        if self.evict_if_stale(&mut entries, key, now) {
            return Err(MapError::KeyNotFound);
        }
        Self::live_entry(&entries, key, now)
            .map(|entry| entry.value.clone())
            .ok_or(MapError::KeyNotFound)
    }

    /// Gets the value for a key, or `default` if it is absent or expired.
    pub fn get_or(&self, key: &K, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Remaining lifetime of a live key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(duration))` if the key exists and has a deadline
    /// - `Ok(None)` if the key exists and never expires
    /// - `Err(MapError::KeyNotFound)` if the key doesn't exist or has expired
    pub fn ttl(&self, key: &K) -> Result<Option<Duration>> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        Self::live_entry(&self.read(), key, now)
            .map(|entry| entry.remaining_at(now))
            .ok_or(MapError::KeyNotFound)
    }

    /// Deletes a key and returns its value if it was live.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        self.write()
            .remove(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value)
    }

    /// Sets a key only if no live entry exists for it.
    ///
    /// A stale entry counts as absent and is replaced.
    ///
    /// # Returns
    ///
    /// Returns `true` if the value was inserted.
    pub fn set_if_absent(&self, key: K, value: V, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        let mut entries = self.write();
        if Self::live_entry(&entries, &key, now).is_some() {
            return false;
        }
        self.insert_held(&mut entries, key, Entry::with_optional_ttl(value, ttl), now)
    }

    /// Returns the live value for `key`, inserting `make()` first if needed.
    ///
    /// The check and the insert happen under one guard acquisition. `make`
    /// runs while the guard is held and must not touch this store.
    pub fn get_or_insert_with<F>(&self, key: K, ttl: Option<Duration>, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let mut entries = self.write();
        if let Some(entry) = Self::live_entry(&entries, &key, now) {
            return entry.value.clone();
        }
        let value = make();
        self.insert_held(&mut entries, key, Entry::with_optional_ttl(value.clone(), ttl), now);
        value
    }
}

impl<K, V> Store<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Snapshot of live keys.
    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        self.read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Snapshot of live values.
    pub fn values(&self) -> Vec<V> {
        let now = Instant::now();
        self.read()
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Snapshot of live key/value pairs.
    ///
    /// The snapshot is taken under one guard acquisition and does not track
    /// later mutations.
    pub fn items(&self) -> Vec<(K, V)> {
        let now = Instant::now();
        self.read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }
}

impl<K, V> Sweep for Store<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn sweep(&self) -> u64 {
        self.purge_expired()
    }

    fn resident(&self) -> usize {
        self.raw_len()
    }
}

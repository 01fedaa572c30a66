//! # ttlmap - A Concurrent In-Memory Map with Expiring Entries
//!
//! ttlmap is a key-value map for use inside a single process, where every
//! entry can carry a time-to-live. Once its deadline passes an entry is gone
//! for every reader, and a background reaper eventually frees its memory.
//!
//! ## Features
//!
//! - **Per-Entry TTL**: each `set` may give its own TTL, or fall back to a default
//! - **Thread Safe**: share one map across threads and tasks behind an `Arc`
//! - **Lazy + Active Expiry**: deadlines are checked on every read, and a
//!   Tokio task sweeps out entries nobody reads again
//! - **Clean Teardown**: dropping the map stops its reaper
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          ExpiringMap                            │
//! │                                                                 │
//! │   set / get / delete / contains / len / keys / items            │
//! │                         │                                       │
//! │                         ▼                                       │
//! │   ┌─────────────────────────────────────────────────────────┐   │
//! │   │                        Store                            │   │
//! │   │          RwLock<HashMap<K, Entry<V>>>                   │   │
//! │   └─────────────────────────────────────────────────────────┘   │
//! │                         ▲                                       │
//! │                         │                                       │
//! │   ┌─────────────────────┴───────────────────────────────────┐   │
//! │   │                       Reaper                            │   │
//! │   │               (Background Tokio Task)                   │   │
//! │   └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use ttlmap::{ExpiringMap, MapConfig, MapError};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let map = ExpiringMap::with_config(
//!         MapConfig::default().with_sweep_interval(Duration::from_millis(50)),
//!     );
//!
//!     map.set("session", "abc123", Some(Duration::from_millis(20)));
//!     map.set("user", "ariz", None);
//!
//!     tokio::time::sleep(Duration::from_millis(30)).await;
//!
//!     assert_eq!(map.get(&"session"), Err(MapError::KeyNotFound));
//!     assert_eq!(map.get(&"user"), Ok("ariz"));
//!     assert_eq!(map.len(), 1);
//!
//!     map.shutdown().await;
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`map`]: the [`ExpiringMap`] facade
//! - [`storage`]: the guarded store and the background reaper
//! - [`config`]: map configuration and process-wide defaults
//! - [`error`]: error types
//!
//! ## Design Highlights
//!
//! ### One Guard
//!
//! All operations, and the reaper's sweep, are serialized by a single lock.
//! Composite operations run against the guard they already hold rather than
//! acquiring it again.
//!
//! ### Lazy + Active Expiry
//!
//! Entries with a TTL are expired in two ways:
//! 1. **Lazy**: every read compares the deadline with the current instant
//! 2. **Active**: a background task periodically removes expired entries
//!
//! Both use the same comparison, so a read racing the reaper reports the key
//! as absent either way.

pub mod config;
pub mod error;
pub mod map;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{install_global_defaults, MapConfig, DEFAULT_SWEEP_INTERVAL};
pub use error::{ConfigError, MapError, Result};
pub use map::ExpiringMap;
pub use storage::{Reaper, ReaperState, StoreStats};

/// Version of ttlmap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

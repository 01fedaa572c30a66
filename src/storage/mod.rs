//! Storage Module
//!
//! This module provides the building blocks of an [`ExpiringMap`](crate::ExpiringMap):
//! a guarded store with lazy expiry, and a background reaper that physically
//! removes what has expired.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │          RwLock<HashMap<K, Entry<V>>>  (the Guard)          │
//! │   get / set / delete / contains / len / keys / items        │
//! │          each one compares deadlines lazily                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ sweep() under the same guard
//!              ┌─────────────┴─────────────┐
//!              │          Reaper           │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Single Guard**: every read, write and sweep is serialized by one lock
//! - **Lazy Expiry**: expired entries are invisible as soon as their deadline passes
//! - **Active Expiry**: the reaper reclaims entries nobody reads again
//!
//! ## Example
//!
//! ```
//! use ttlmap::storage::Store;
//! use std::time::Duration;
//!
//! let store = Store::new();
//!
//! // Basic operations
//! store.set("name", "Ariz", None);
//! assert_eq!(store.get(&"name"), Ok("Ariz"));
//!
//! // Set with TTL
//! store.set("session", "token123", Some(Duration::from_secs(3600)));
//! assert_eq!(store.len(), 2);
//! ```

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{Entry, Store, StoreStats};
pub use expiry::{Reaper, ReaperState, Sweep};

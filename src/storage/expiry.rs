//! Background Reaper
//!
//! This module implements a background task that periodically scans a store
//! for expired entries and removes them. This is "active expiry" as opposed
//! to the "lazy expiry" readers apply on access.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry keeps reads correct, but an entry that expires and is never
//! read again would stay in memory forever. The reaper bounds that growth.
//! It is never required for correctness.
//!
//! ## Design
//!
//! The reaper runs as a Tokio task and:
//! 1. Sleeps for a fixed interval (default: 1s)
//! 2. Wakes up and sweeps the whole store under its guard
//! 3. Logs how many entries were removed
//!
//! ## Lifecycle
//!
//! ```text
//!   start() ──> Running ──stop() / drop──> Stopped
//! ```
//!
//! `Stopped` is terminal. The task only holds a weak reference to the store,
//! so it also exits once the store itself is gone.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Something a reaper can sweep.
pub trait Sweep: Send + Sync + 'static {
    /// Physically removes expired entries and returns how many were removed.
    fn sweep(&self) -> u64;

    /// Physical entry count, stale entries included.
    fn resident(&self) -> usize;
}

/// Reaper lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    /// The sweep task is scheduled
    Running,
    /// Shutdown was requested; terminal
    Stopped,
}

/// A handle to a running reaper.
///
/// When this handle is dropped, the reaper task will be stopped.
#[derive(Debug)]
pub struct Reaper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    /// The sweep task, taken by `shutdown`
    pub(crate) task: Option<JoinHandle<()>>,

    interval: Duration,
}

impl Reaper {
    /// Starts the reaper on the current Tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `target` - The store to sweep
    /// * `interval` - Time between sweeps
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context or if `interval`
    /// is zero. [`ExpiringMap`](crate::ExpiringMap) checks both before
    /// calling this.
    ///
    /// # Example
    ///
    /// ```
    /// use ttlmap::storage::{Reaper, ReaperState, Store};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let store: Arc<Store<String, String>> = Arc::new(Store::new());
    /// let reaper = Reaper::start(&store, Duration::from_millis(100));
    /// assert_eq!(reaper.state(), ReaperState::Running);
    ///
    /// // Dropping the reaper will stop it
    /// drop(reaper);
    /// # }
    /// ```
    pub fn start<S: Sweep>(target: &Arc<S>, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "reaper interval must be non-zero");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(reaper_loop(Arc::downgrade(target), interval, shutdown_rx));

        info!(interval_ms = interval.as_millis() as u64, "Background reaper started");

        Self {
            shutdown_tx,
            task: Some(task),
            interval,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReaperState {
        if *self.shutdown_tx.borrow() {
            ReaperState::Stopped
        } else {
            ReaperState::Running
        }
    }

    /// Time between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the reaper.
    ///
    /// Calling this more than once has no further effect. This is called
    /// automatically when the handle is dropped.
    pub fn stop(&self) {
        // Only the first stop notifies the task
        let stopped = self.shutdown_tx.send_if_modified(|stopped| {
            let first = !*stopped;
            *stopped = true;
            first
        });
        if stopped {
            info!("Background reaper stopped");
        }
    }

    /// Stops the reaper and waits for its task to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main reaper loop.
async fn reaper_loop<S: Sweep>(
    target: Weak<S>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first immediate tick - wait a full interval before sweeping
    ticker.tick().await;

    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Reaper received shutdown signal");
                    return;
                }
                continue;
            }
        }

        let Some(store) = target.upgrade() else {
            debug!("Reaper target dropped, exiting");
            return;
        };

        let expired = store.sweep();
        if expired > 0 {
            debug!(expired, remaining = store.resident(), "Expired entries reaped");
        }
    }
}

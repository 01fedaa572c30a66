//! Map configuration.
//!
//! A [`MapConfig`] carries the two timing knobs of an [`ExpiringMap`]:
//! the TTL applied when `set` is called without one, and the interval
//! between background sweeps.
//!
//! Process-wide defaults can be installed once at startup with
//! [`install_global_defaults`]. After that they are read-only, and every map
//! built with [`ExpiringMap::new`] picks them up.
//!
//! [`ExpiringMap`]: crate::ExpiringMap
//! [`ExpiringMap::new`]: crate::ExpiringMap::new

use crate::error::ConfigError;
use std::sync::OnceLock;
use std::time::Duration;

/// Default interval between reaper sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

static GLOBAL_DEFAULTS: OnceLock<MapConfig> = OnceLock::new();

/// Configuration for an expiring map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConfig {
    /// TTL applied by `set` when the caller passes none (default: never expire)
    pub default_ttl: Option<Duration>,

    /// Interval between reaper sweeps (default: 1s). `None` or zero disables
    /// the reaper; lazy expiry still applies.
    pub sweep_interval: Option<Duration>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

impl MapConfig {
    /// Creates a configuration with built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the installed process-wide defaults, or the built-in ones.
    pub fn global() -> Self {
        GLOBAL_DEFAULTS.get().cloned().unwrap_or_default()
    }

    /// Sets the TTL used when `set` is called without one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Sets the interval between reaper sweeps.
    ///
    /// A zero interval disables the reaper.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Disables background sweeping.
    pub fn without_sweeping(mut self) -> Self {
        self.sweep_interval = None;
        self
    }

    /// The sweep interval to actually run the reaper with, if any.
    pub fn effective_sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval.filter(|interval| !interval.is_zero())
    }
}

/// Installs process-wide defaults.
///
/// Succeeds only on the first call; the installed value never changes after.
pub fn install_global_defaults(config: MapConfig) -> Result<(), ConfigError> {
    GLOBAL_DEFAULTS
        .set(config)
        .map_err(|_| ConfigError::DefaultsAlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();
        assert_eq!(config.default_ttl, None);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_builder_chaining() {
        let config = MapConfig::new()
            .with_default_ttl(Duration::from_secs(30))
            .with_sweep_interval(Duration::from_millis(250));
        assert_eq!(config.default_ttl, Some(Duration::from_secs(30)));
        assert_eq!(
            config.effective_sweep_interval(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_zero_interval_disables_sweeping() {
        let config = MapConfig::new().with_sweep_interval(Duration::ZERO);
        assert_eq!(config.effective_sweep_interval(), None);

        let config = MapConfig::new().without_sweeping();
        assert_eq!(config.effective_sweep_interval(), None);
    }

    // The only test in this binary that touches the process-wide slot.
    #[test]
    fn test_global_defaults_install_once() {
        let installed = MapConfig::new().with_default_ttl(Duration::from_secs(42));
        assert!(install_global_defaults(installed.clone()).is_ok());
        assert_eq!(MapConfig::global(), installed);

        let again = install_global_defaults(MapConfig::new());
        assert_eq!(again, Err(ConfigError::DefaultsAlreadyInstalled));
        assert_eq!(MapConfig::global(), installed);
    }
}

//! Error types for ttlmap.
//!
//! Absence is the only failure a map reports. It is an ordinary outcome the
//! caller handles with normal control flow, not a fault worth logging.

use thiserror::Error;

/// Errors returned by map accessors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The key was never set, was deleted, or its deadline has passed
    #[error("key not found")]
    KeyNotFound,
}

/// Errors from process-wide configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Global defaults can be installed exactly once per process
    #[error("global map defaults are already installed")]
    DefaultsAlreadyInstalled,
}

/// Result alias for map accessors.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_display() {
        assert_eq!(MapError::KeyNotFound.to_string(), "key not found");
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::DefaultsAlreadyInstalled.to_string(),
            "global map defaults are already installed"
        );
    }
}

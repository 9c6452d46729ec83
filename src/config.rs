//! Configuration Module
//!
//! Handles loading cache and store settings from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Cache and store configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries held by an in-memory cache
    pub cache_capacity: usize,
    /// File backing the keyed store
    pub store_path: PathBuf,
    /// Namespaces declared when the store is initialized
    pub namespaces: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `STORE_PATH` - Store file path (default: itam_cache.redb)
    /// - `STORE_NAMESPACES` - Comma separated namespaces (default: assets,tickets,users)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            namespaces: env::var("STORE_NAMESPACES")
                .ok()
                .map(|v| parse_namespaces(&v))
                .unwrap_or(defaults.namespaces),
        }
    }

    /// Rejects settings the cache or store would refuse later.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(CacheError::Configuration(
                "CACHE_CAPACITY must be greater than zero".to_string(),
            ));
        }
        if self.namespaces.is_empty() {
            return Err(CacheError::Configuration(
                "STORE_NAMESPACES must name at least one namespace".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            store_path: PathBuf::from("itam_cache.redb"),
            namespaces: vec![
                "assets".to_string(),
                "tickets".to_string(),
                "users".to_string(),
            ],
        }
    }
}

fn parse_namespaces(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.store_path, PathBuf::from("itam_cache.redb"));
        assert_eq!(config.namespaces, vec!["assets", "tickets", "users"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("STORE_PATH");
        env::remove_var("STORE_NAMESPACES");

        let config = Config::from_env();
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.store_path, PathBuf::from("itam_cache.redb"));
        assert_eq!(config.namespaces.len(), 3);
    }

    #[test]
    fn test_parse_namespaces() {
        assert_eq!(
            parse_namespaces(" assets, tickets ,,licenses "),
            vec!["assets", "tickets", "licenses"]
        );
        assert!(parse_namespaces(" , ").is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            cache_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration(_))
        ));

        let config = Config {
            namespaces: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}

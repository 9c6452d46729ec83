//! Namespace validation and catalog metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};
use crate::store::tables::RESERVED_PREFIX;

/// Longest accepted namespace name in bytes
pub const MAX_NAMESPACE_LENGTH: usize = 128;

/// Catalog entry recorded when a namespace is first created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Schema version whose upgrade created this namespace
    pub created_in_version: u64,
}

impl NamespaceInfo {
    pub fn new(name: impl Into<String>, created_in_version: u64) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            created_in_version,
        }
    }
}

/// Checks that `name` can be used as a namespace.
pub fn validate_namespace(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CacheError::InvalidNamespace(
            "namespace name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAMESPACE_LENGTH {
        return Err(CacheError::InvalidNamespace(format!(
            "namespace name exceeds maximum length of {} bytes",
            MAX_NAMESPACE_LENGTH
        )));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(CacheError::InvalidNamespace(format!(
            "'{}' uses the reserved prefix '{}'",
            name, RESERVED_PREFIX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_namespace("assets").is_ok());
        assert!(validate_namespace("ticket_comments").is_ok());
        assert!(validate_namespace("users-2024").is_ok());
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(matches!(
            validate_namespace(""),
            Err(CacheError::InvalidNamespace(_))
        ));
        assert!(matches!(
            validate_namespace("   "),
            Err(CacheError::InvalidNamespace(_))
        ));
    }

    #[test]
    fn test_rejects_reserved_prefix() {
        assert!(matches!(
            validate_namespace("__catalog"),
            Err(CacheError::InvalidNamespace(_))
        ));
    }

    #[test]
    fn test_rejects_long_name() {
        let name = "n".repeat(MAX_NAMESPACE_LENGTH + 1);
        assert!(validate_namespace(&name).is_err());
    }

    #[test]
    fn test_info_roundtrips_through_json() {
        let info = NamespaceInfo::new("assets", 3);
        let bytes = serde_json::to_vec(&info).unwrap();
        let decoded: NamespaceInfo = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, info);
    }
}

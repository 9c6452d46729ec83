//! Error types for the cache and record store
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and the keyed store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid construction parameter or configuration value
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Underlying storage engine could not be opened or upgraded
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store is not in the ready state
    #[error("Store not ready: {0}")]
    NotReady(String),

    /// Namespace was never declared through init
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Namespace name is empty or reserved
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    /// Record has no usable id or cannot be encoded/decoded
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A read or write failed inside the storage engine
    #[error("Transaction failed: {0}")]
    TransactionFailure(String),
}

// == Storage Engine Conversions ==
impl From<redb::DatabaseError> for CacheError {
    fn from(e: redb::DatabaseError) -> Self {
        CacheError::StoreUnavailable(e.to_string())
    }
}

impl From<redb::TransactionError> for CacheError {
    fn from(e: redb::TransactionError) -> Self {
        CacheError::TransactionFailure(e.to_string())
    }
}

impl From<redb::TableError> for CacheError {
    fn from(e: redb::TableError) -> Self {
        CacheError::TransactionFailure(e.to_string())
    }
}

impl From<redb::StorageError> for CacheError {
    fn from(e: redb::StorageError) -> Self {
        CacheError::TransactionFailure(e.to_string())
    }
}

impl From<redb::CommitError> for CacheError {
    fn from(e: redb::CommitError) -> Self {
        CacheError::TransactionFailure(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::InvalidRecord(e.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(e: tokio::task::JoinError) -> Self {
        CacheError::TransactionFailure(format!("storage task failed: {}", e))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::NamespaceNotFound("tickets".to_string());
        assert_eq!(err.to_string(), "Namespace not found: tickets");

        let err = CacheError::Configuration("capacity must be positive".to_string());
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_json_error_maps_to_invalid_record() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CacheError = parse_err.into();
        assert!(matches!(err, CacheError::InvalidRecord(_)));
    }
}

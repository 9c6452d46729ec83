//! Redb table definitions for the keyed store.

use redb::TableDefinition;

/// Namespace name -> JSON-encoded `NamespaceInfo`
pub const CATALOG: TableDefinition<&str, &[u8]> = TableDefinition::new("__catalog");

/// Store-level counters such as the schema version
pub const META: TableDefinition<&str, u64> = TableDefinition::new("__meta");

pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Prefix reserved for the store's own tables.
pub const RESERVED_PREFIX: &str = "__";

/// Table holding the records of one namespace: record id -> JSON bytes.
pub fn namespace_table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

//! Store Module
//!
//! Asynchronous, namespaced record persistence over an embedded redb database.
//!
//! Each namespace maps to its own table of `id -> JSON record`. Namespaces are
//! declared through [`KeyedStore::init`]; the persisted catalog and schema
//! version live in reserved `__` tables next to them.

mod keyed;
mod namespace;
mod record;
mod tables;


// Re-export public types
pub use keyed::{KeyedStore, StorePhase};
pub use namespace::{validate_namespace, NamespaceInfo, MAX_NAMESPACE_LENGTH};
pub use record::Record;

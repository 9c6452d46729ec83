//! Keyed Store Module
//!
//! Asynchronous namespaced record storage backed by redb. Every engine call
//! runs on the blocking pool.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::{Builder, Database, ReadableTable, ReadableTableMetadata, WriteTransaction};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::store::namespace::{validate_namespace, NamespaceInfo};
use crate::store::record::Record;
use crate::store::tables::{namespace_table, CATALOG, META, SCHEMA_VERSION_KEY};

// == Store Phase ==
/// Lifecycle phase of a [`KeyedStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

impl fmt::Display for StorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorePhase::Uninitialized => "uninitialized",
            StorePhase::Initializing => "initializing",
            StorePhase::Ready => "ready",
            StorePhase::Closed => "closed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn open_database(&self) -> Result<Database> {
        match self {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        CacheError::StoreUnavailable(format!(
                            "cannot create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                Ok(Database::create(path)?)
            }
            Location::Memory => Ok(Builder::new().create_with_backend(InMemoryBackend::new())?),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Memory => f.write_str(":memory:"),
        }
    }
}

/// Namespaces declared on this handle plus the persisted schema version.
#[derive(Debug, Clone, Default)]
struct Catalog {
    version: u64,
    namespaces: BTreeMap<String, NamespaceInfo>,
}

enum State {
    Uninitialized,
    Initializing,
    Ready { db: Arc<Database>, catalog: Catalog },
    Closed,
}

impl State {
    fn phase(&self) -> StorePhase {
        match self {
            State::Uninitialized => StorePhase::Uninitialized,
            State::Initializing => StorePhase::Initializing,
            State::Ready { .. } => StorePhase::Ready,
            State::Closed => StorePhase::Closed,
        }
    }
}

struct Inner {
    location: Location,
    state: RwLock<State>,
    /// Serializes init calls
    init_lock: Mutex<()>,
}

/// Outcome of declaring namespaces against the persisted catalog.
struct Upgrade {
    version: u64,
    declared: Vec<NamespaceInfo>,
    created: Vec<String>,
}

impl Inner {
    /// Moves the store to `Ready` with `requested` declared, or back to where it was.
    async fn declare(&self, requested: BTreeSet<String>) -> Result<()> {
        let _init = self.init_lock.lock().await;

        let existing = {
            let mut state = self.state.write().await;
            let existing = match &*state {
                State::Ready { db, catalog } => Some((Arc::clone(db), catalog.clone())),
                State::Uninitialized => None,
                other => {
                    return Err(CacheError::NotReady(format!(
                        "cannot init a store that is {}",
                        other.phase()
                    )))
                }
            };
            if existing.is_none() {
                *state = State::Initializing;
            }
            existing
        };
        let first_init = existing.is_none();

        let location = self.location.clone();
        let reuse = existing.as_ref().map(|(db, _)| Arc::clone(db));
        let names: Vec<String> = requested.into_iter().collect();

        let outcome = tokio::task::spawn_blocking(move || open_and_upgrade(&location, reuse, &names))
            .await
            .map_err(CacheError::from)
            .and_then(|result| result)
            .map_err(|e| match e {
                CacheError::TransactionFailure(msg) => CacheError::StoreUnavailable(msg),
                other => other,
            });

        let mut state = self.state.write().await;
        match outcome {
            Ok((db, upgrade)) => {
                if matches!(*state, State::Closed) {
                    return Err(CacheError::NotReady(
                        "store was closed during init".to_string(),
                    ));
                }

                let mut catalog = existing.map(|(_, catalog)| catalog).unwrap_or_default();
                catalog.version = upgrade.version;
                for info in upgrade.declared {
                    catalog.namespaces.insert(info.name.clone(), info);
                }

                if !upgrade.created.is_empty() {
                    info!(
                        location = %self.location,
                        version = upgrade.version,
                        created = ?upgrade.created,
                        "Upgraded store schema"
                    );
                }
                info!(
                    location = %self.location,
                    version = catalog.version,
                    namespaces = catalog.namespaces.len(),
                    "Keyed store ready"
                );

                *state = State::Ready { db, catalog };
                Ok(())
            }
            Err(e) => {
                if first_init && matches!(*state, State::Initializing) {
                    *state = State::Uninitialized;
                }
                warn!(location = %self.location, error = %e, "Keyed store init failed");
                Err(e)
            }
        }
    }
}

// == Keyed Store ==
/// Namespaced, durable key/value store for records.
///
/// The store must be initialized with the namespaces it will serve before any
/// read or write; until then every operation fails with
/// `CacheError::NotReady`. Clones share the same underlying database, and
/// concurrent calls are isolated by the engine's transactions. Failures are
/// returned to the caller as-is, nothing is retried.
#[derive(Clone)]
pub struct KeyedStore {
    inner: Arc<Inner>,
}

impl KeyedStore {
    // == Constructors ==
    /// Creates a store persisted at `path`. The file is opened (or created) by `init`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_location(Location::File(path.as_ref().to_path_buf()))
    }

    /// Creates a store living only in memory, dropped with the last handle.
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            inner: Arc::new(Inner {
                location,
                state: RwLock::new(State::Uninitialized),
                init_lock: Mutex::new(()),
            }),
        }
    }

    /// Path of the backing file, None for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.inner.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    // == Init ==
    /// Declares the namespaces this handle will use and makes the store ready.
    ///
    /// Namespaces unknown to the persisted catalog are created and bump the
    /// schema version by one; already known namespaces are left untouched.
    /// Calling `init` again with more namespaces adds them without affecting
    /// existing data. Open or upgrade failures surface as
    /// `CacheError::StoreUnavailable`.
    ///
    /// The initialization runs on its own task: dropping the returned future
    /// does not interrupt it, and a retried `init` waits for it to settle.
    pub async fn init<I, S>(&self, namespaces: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested: BTreeSet<String> = namespaces.into_iter().map(Into::into).collect();
        for name in &requested {
            validate_namespace(name)?;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.declare(requested).await }).await?
    }

    // == Get ==
    /// Reads the record stored under `id`, or None when absent.
    pub async fn get<R: Record>(&self, namespace: &str, id: &str) -> Result<Option<R>> {
        let db = self.database_for(namespace).await?;
        let (ns, key) = (namespace.to_string(), id.to_string());

        let record = run_blocking(db, move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(namespace_table(&ns))?;
            let found = match table.get(key.as_str())? {
                Some(bytes) => Some(serde_json::from_slice::<R>(bytes.value())?),
                None => None,
            };
            Ok(found)
        })
        .await?;

        debug!(namespace, id, hit = record.is_some(), "get");
        Ok(record)
    }

    // == Get All ==
    /// Reads every record of a namespace. Callers must not rely on the order.
    pub async fn get_all<R: Record>(&self, namespace: &str) -> Result<Vec<R>> {
        let db = self.database_for(namespace).await?;
        let ns = namespace.to_string();

        let records = run_blocking(db, move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(namespace_table(&ns))?;
            let mut records = Vec::new();
            for entry in table.iter()? {
                let (_, bytes) = entry?;
                records.push(serde_json::from_slice::<R>(bytes.value())?);
            }
            Ok(records)
        })
        .await?;

        debug!(namespace, count = records.len(), "get_all");
        Ok(records)
    }

    /// Number of records in a namespace.
    pub async fn count(&self, namespace: &str) -> Result<u64> {
        let db = self.database_for(namespace).await?;
        let ns = namespace.to_string();

        run_blocking(db, move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(namespace_table(&ns))?;
            Ok(table.len()?)
        })
        .await
    }

    // == Set ==
    /// Inserts or replaces a record, keyed by its id.
    pub async fn set<R: Record>(&self, namespace: &str, record: &R) -> Result<()> {
        let db = self.database_for(namespace).await?;
        let id = record_id(record)?.to_string();
        let bytes = serde_json::to_vec(record)?;
        let (ns, key) = (namespace.to_string(), id.clone());

        run_blocking(db, move |db| {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(namespace_table(&ns))?;
                table.insert(key.as_str(), bytes.as_slice())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await?;

        debug!(namespace, id = %id, "set");
        Ok(())
    }

    // == Bulk Set ==
    /// Writes all records in a single transaction and returns how many were written.
    ///
    /// Either every record is committed or none is: a record without an id or
    /// a failed write aborts the whole batch. Duplicate ids within one batch
    /// resolve to the last occurrence.
    pub async fn bulk_set<R: Record>(&self, namespace: &str, records: Vec<R>) -> Result<usize> {
        let db = self.database_for(namespace).await?;
        if records.is_empty() {
            return Ok(0);
        }
        let ns = namespace.to_string();

        let result = run_blocking(db, move |db| {
            let txn = db.begin_write()?;
            match write_batch(&txn, &ns, &records) {
                Ok(written) => {
                    txn.commit()?;
                    Ok(written)
                }
                Err(e) => {
                    if let Err(abort) = txn.abort() {
                        warn!(namespace = %ns, error = %abort, "Failed to abort bulk write");
                    }
                    Err(e)
                }
            }
        })
        .await;

        match &result {
            Ok(written) => debug!(namespace, written = *written, "bulk_set committed"),
            Err(e) => warn!(namespace, error = %e, "bulk_set aborted, nothing written"),
        }
        result
    }

    // == Delete ==
    /// Removes the record stored under `id`. Returns whether it existed.
    pub async fn delete(&self, namespace: &str, id: &str) -> Result<bool> {
        let db = self.database_for(namespace).await?;
        let (ns, key) = (namespace.to_string(), id.to_string());

        let removed = run_blocking(db, move |db| {
            let txn = db.begin_write()?;
            let removed = txn
                .open_table(namespace_table(&ns))?
                .remove(key.as_str())?
                .is_some();
            txn.commit()?;
            Ok(removed)
        })
        .await?;

        debug!(namespace, id, removed, "delete");
        Ok(removed)
    }

    // == Clear ==
    /// Removes every record of a namespace; the namespace stays declared.
    ///
    /// Returns the number of records removed.
    pub async fn clear(&self, namespace: &str) -> Result<u64> {
        let db = self.database_for(namespace).await?;
        let ns = namespace.to_string();

        let removed = run_blocking(db, move |db| {
            let txn = db.begin_write()?;
            let removed = txn.open_table(namespace_table(&ns))?.len()?;
            txn.delete_table(namespace_table(&ns))?;
            txn.open_table(namespace_table(&ns))?;
            txn.commit()?;
            Ok(removed)
        })
        .await?;

        info!(namespace, removed, "Cleared namespace");
        Ok(removed)
    }

    // == Introspection ==
    /// Current lifecycle phase.
    pub async fn phase(&self) -> StorePhase {
        self.inner.state.read().await.phase()
    }

    pub async fn is_ready(&self) -> bool {
        self.phase().await == StorePhase::Ready
    }

    /// Catalog entries of the namespaces declared on this handle.
    pub async fn namespaces(&self) -> Result<Vec<NamespaceInfo>> {
        match &*self.inner.state.read().await {
            State::Ready { catalog, .. } => Ok(catalog.namespaces.values().cloned().collect()),
            other => Err(not_ready(other)),
        }
    }

    /// Persisted schema version; increases each time `init` creates namespaces.
    pub async fn schema_version(&self) -> Result<u64> {
        match &*self.inner.state.read().await {
            State::Ready { catalog, .. } => Ok(catalog.version),
            other => Err(not_ready(other)),
        }
    }

    // == Close ==
    /// Releases this handle's hold on the database. Later calls fail with `NotReady`.
    ///
    /// Operations already in flight finish against the database they started on.
    pub async fn close(&self) {
        let mut state = self.inner.state.write().await;
        if !matches!(*state, State::Closed) {
            info!(location = %self.inner.location, "Keyed store closed");
        }
        *state = State::Closed;
    }

    async fn database_for(&self, namespace: &str) -> Result<Arc<Database>> {
        match &*self.inner.state.read().await {
            State::Ready { db, catalog } if catalog.namespaces.contains_key(namespace) => {
                Ok(Arc::clone(db))
            }
            State::Ready { .. } => Err(CacheError::NamespaceNotFound(namespace.to_string())),
            other => Err(not_ready(other)),
        }
    }
}

impl fmt::Debug for KeyedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedStore")
            .field("location", &self.inner.location)
            .finish_non_exhaustive()
    }
}

// == Helpers ==
fn not_ready(state: &State) -> CacheError {
    CacheError::NotReady(format!("store is {}", state.phase()))
}

fn record_id<R: Record>(record: &R) -> Result<&str> {
    record
        .id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CacheError::InvalidRecord("record has no string id".to_string()))
}

async fn run_blocking<T, F>(db: Arc<Database>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&db)).await?
}

fn write_batch<R: Record>(txn: &WriteTransaction, namespace: &str, records: &[R]) -> Result<usize> {
    let mut table = txn.open_table(namespace_table(namespace))?;
    for record in records {
        let id = record_id(record)?;
        let bytes = serde_json::to_vec(record)?;
        table.insert(id, bytes.as_slice())?;
    }
    Ok(records.len())
}

fn open_and_upgrade(
    location: &Location,
    reuse: Option<Arc<Database>>,
    names: &[String],
) -> Result<(Arc<Database>, Upgrade)> {
    let db = match reuse {
        Some(db) => db,
        None => Arc::new(location.open_database()?),
    };
    let upgrade = upgrade_catalog(&db, names)?;
    Ok((db, upgrade))
}

/// Creates tables for namespaces missing from the catalog in one write transaction.
fn upgrade_catalog(db: &Database, names: &[String]) -> Result<Upgrade> {
    let txn = db.begin_write()?;
    let upgrade = {
        let mut catalog = txn.open_table(CATALOG)?;
        let mut meta = txn.open_table(META)?;
        let current = meta.get(SCHEMA_VERSION_KEY)?.map(|v| v.value()).unwrap_or(0);
        let next = current + 1;

        let mut declared = Vec::with_capacity(names.len());
        let mut created = Vec::new();
        for name in names {
            let known = catalog
                .get(name.as_str())?
                .map(|bytes| serde_json::from_slice::<NamespaceInfo>(bytes.value()))
                .transpose()?;

            match known {
                Some(info) => declared.push(info),
                None => {
                    txn.open_table(namespace_table(name))?;
                    let info = NamespaceInfo::new(name.clone(), next);
                    let bytes = serde_json::to_vec(&info)?;
                    catalog.insert(name.as_str(), bytes.as_slice())?;
                    created.push(name.clone());
                    declared.push(info);
                }
            }
        }

        let version = if created.is_empty() {
            current
        } else {
            meta.insert(SCHEMA_VERSION_KEY, next)?;
            next
        };

        Upgrade {
            version,
            declared,
            created,
        }
    };
    txn.commit()?;
    Ok(upgrade)
}

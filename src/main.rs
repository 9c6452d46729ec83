//! ITAM Cache inspector
//!
//! Opens the configured record store, declares the configured namespaces and
//! prints a JSON report of the catalog, including how a bounded cache of the
//! configured capacity would hold each namespace.

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itam_cache::{BoundedCache, CacheStats, Config, KeyedStore, NamespaceInfo};

#[derive(Debug, Serialize)]
struct NamespaceReport {
    #[serde(flatten)]
    info: NamespaceInfo,
    records: u64,
    warm_cache: CacheStats,
}

#[derive(Debug, Serialize)]
struct StoreReport {
    store_path: String,
    schema_version: u64,
    cache_capacity: usize,
    namespaces: Vec<NamespaceReport>,
}

/// Main entry point for the store inspector.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Open the store and declare the configured namespaces
/// 4. Count records and warm a bounded cache per namespace
/// 5. Print the JSON report and close the store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itam_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: cache_capacity={}, store_path={}, namespaces={:?}",
        config.cache_capacity,
        config.store_path.display(),
        config.namespaces
    );

    let store = KeyedStore::open(&config.store_path);
    store
        .init(config.namespaces.iter().cloned())
        .await
        .with_context(|| format!("failed to open store at {}", config.store_path.display()))?;

    let mut namespaces = Vec::new();
    for info in store.namespaces().await? {
        let records = store.count(&info.name).await?;
        let warm_cache = warm(&store, &info.name, config.cache_capacity).await?;
        namespaces.push(NamespaceReport {
            info,
            records,
            warm_cache,
        });
    }

    let report = StoreReport {
        store_path: config.store_path.display().to_string(),
        schema_version: store.schema_version().await?,
        cache_capacity: config.cache_capacity,
        namespaces,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    store.close().await;
    info!("Inspection complete");
    Ok(())
}

/// Loads a namespace into a fresh cache and returns the resulting statistics.
async fn warm(store: &KeyedStore, namespace: &str, capacity: usize) -> anyhow::Result<CacheStats> {
    let mut cache = BoundedCache::new(capacity)?;
    for record in store.get_all::<Value>(namespace).await? {
        if let Some(id) = record.get("id").and_then(Value::as_str).map(String::from) {
            cache.set(id, record);
        }
    }
    Ok(cache.stats())
}

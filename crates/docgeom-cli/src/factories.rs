//! Store construction from configuration
//!
//! One source store and one relational store per run. The relational store
//! serves both as the geometry source and as the destination.

use anyhow::{Context, Result};
use docgeom_config::{RelationalConfig, RelationalDriver, SourceStoreConfig};
use docgeom_core::{DestinationStore, GeometrySource, SourceStore};
use docgeom_surrealdb::SurrealSourceStore;
use std::sync::Arc;
use tracing::info;

/// Relational store viewed through both of its roles
pub struct RelationalStores {
    pub geometry: Arc<dyn GeometrySource>,
    pub destination: Arc<dyn DestinationStore>,
}

impl RelationalStores {
    fn from_store<S>(store: S) -> Self
    where
        S: GeometrySource + DestinationStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            geometry: store.clone(),
            destination: store,
        }
    }
}

/// Connect to the document store named by `config.host`
pub async fn create_source_store(config: &SourceStoreConfig) -> Result<Box<dyn SourceStore>> {
    info!(endpoint = %config.host, "Connecting to source store");
    let store = SurrealSourceStore::connect(config)
        .await
        .with_context(|| format!("Failed to connect to source store at {}", config.host))?;
    Ok(Box::new(store))
}

/// Open the relational backend selected by `config.driver`
pub async fn create_relational_store(config: &RelationalConfig) -> Result<RelationalStores> {
    info!(driver = %config.driver, target = %config, "Connecting to relational store");
    match config.driver {
        RelationalDriver::Postgres => create_postgres(config).await,
        RelationalDriver::Sqlite => create_sqlite(config),
    }
}

#[cfg(feature = "storage-postgres")]
async fn create_postgres(config: &RelationalConfig) -> Result<RelationalStores> {
    let store = docgeom_postgres::PostgresRelationalStore::connect(config)
        .await
        .with_context(|| format!("Failed to connect to {}", config))?;
    Ok(RelationalStores::from_store(store))
}

#[cfg(not(feature = "storage-postgres"))]
async fn create_postgres(_config: &RelationalConfig) -> Result<RelationalStores> {
    anyhow::bail!("docgeom was built without PostgreSQL support (feature storage-postgres)")
}

#[cfg(feature = "storage-sqlite")]
fn create_sqlite(config: &RelationalConfig) -> Result<RelationalStores> {
    let store = docgeom_sqlite::SqliteRelationalStore::open(config)
        .with_context(|| format!("Failed to open {}", config))?;
    Ok(RelationalStores::from_store(store))
}

#[cfg(not(feature = "storage-sqlite"))]
fn create_sqlite(_config: &RelationalConfig) -> Result<RelationalStores> {
    anyhow::bail!("docgeom was built without SQLite support (feature storage-sqlite)")
}

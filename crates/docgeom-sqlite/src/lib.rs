//! SQLite relational backend for docgeom
//!
//! Serves geometry lookups and holds the output table for local runs and
//! tests, standing in for PostgreSQL/PostGIS. Geometry columns hold hex EWKB
//! text or raw WKB blobs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docgeom_sqlite::SqliteRelationalStore;
//! use docgeom_core::DestinationStore;
//!
//! let store = SqliteRelationalStore::open(&config.destination)?;
//! store.truncate().await?;
//! ```

pub mod connection;
pub mod error;
pub mod relational_store;
pub mod schema;

// Re-exports
pub use connection::{SqlitePool, MEMORY_PATH};
pub use error::{SqliteError, SqliteResult};
pub use relational_store::SqliteRelationalStore;
pub use schema::OutputTable;

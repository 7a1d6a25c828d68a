//! PostgreSQL/PostGIS relational backend for docgeom
//!
//! Geometry lookups read the geometry column as text, which PostGIS renders
//! as hex EWKB. Output rows are written with multi-row INSERTs; PostGIS casts
//! the hex text into the geometry column.

pub mod connection;
pub mod error;
pub mod relational_store;

pub use connection::{connect, connect_options};
pub use error::{PostgresError, PostgresResult};
pub use relational_store::PostgresRelationalStore;

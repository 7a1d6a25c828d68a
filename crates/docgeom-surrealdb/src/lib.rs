//! # docgeom SurrealDB backend
//!
//! Reads table metadata and link documents from SurrealDB and writes resolved
//! coordinates back onto link documents.
//!
//! ```rust,no_run
//! use docgeom_config::ConfigLoader;
//! use docgeom_surrealdb::SurrealSourceStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConfigLoader::load_from_file("docgeom.json")?;
//! let store = SurrealSourceStore::connect(&config.source).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod source_store;
pub mod surreal_client;

pub use error::{SurrealError, SurrealResult};
pub use source_store::SurrealSourceStore;
pub use surreal_client::{Document, SurrealClient};

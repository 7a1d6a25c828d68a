//! Store abstractions
//!
//! The pipeline depends on these traits only; backends live in their own crates
//! (`docgeom-surrealdb`, `docgeom-postgres`, `docgeom-sqlite`).

use super::error::{StorageError, StorageResult};
use crate::types::{Coordinates, GeometryOutputRow, LinkRecord, TableMetadata};
use async_trait::async_trait;

/// Document store holding table metadata and link records
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Read at most `limit` table metadata documents
    async fn fetch_table_metadata(&self, limit: usize) -> StorageResult<Vec<TableMetadata>>;

    /// Read at most `limit` link documents, in store order
    async fn fetch_link_records(&self, limit: usize) -> StorageResult<Vec<LinkRecord>>;

    /// Persist resolved coordinates onto the link document `id`
    async fn update_coordinates(&self, id: &str, coordinates: Coordinates) -> StorageResult<()>;
}

/// Relational tables holding the geometries that link records point at
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Hex EWKB of the first row of `table` whose `field` equals `value`.
    ///
    /// `Ok(None)` when no row matches or the geometry is NULL.
    async fn select_geometry(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Option<String>>;
}

/// Output table of the migration
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Remove every row
    async fn truncate(&self) -> StorageResult<()>;

    /// Insert one row
    async fn insert(&self, row: &GeometryOutputRow) -> StorageResult<()>;

    /// Insert several rows, returning how many were written
    async fn insert_batch(&self, rows: &[GeometryOutputRow]) -> StorageResult<usize> {
        for row in rows {
            self.insert(row).await?;
        }
        Ok(rows.len())
    }

    /// Truncate and insert `rows` in batches of `batch_size`.
    ///
    /// Relational backends run this in a single transaction; this default does not.
    async fn replace_all(
        &self,
        rows: &[GeometryOutputRow],
        batch_size: usize,
    ) -> StorageResult<usize> {
        self.truncate().await?;
        let mut written = 0;
        for chunk in rows.chunks(batch_size.max(1)) {
            written += self.insert_batch(chunk).await?;
        }
        Ok(written)
    }
}

/// Quote an SQL identifier with double quotes, doubling embedded quotes.
///
/// Table and field names come from metadata documents, so they are never
/// spliced into statements unquoted.
pub fn quote_identifier(name: &str) -> StorageResult<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(StorageError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

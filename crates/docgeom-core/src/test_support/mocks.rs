//! In-memory store mocks
//!
//! Each mock keeps its state behind `Arc<Mutex<_>>`, records every call for
//! assertions and can be told to fail.
//!
//! ```rust,ignore
//! use docgeom_core::test_support::mocks::MockGeometrySource;
//! use docgeom_core::storage::GeometrySource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = MockGeometrySource::new();
//! source.insert_geometry("Parcels", "ParcelID", "A1", "0101000000000000000000f03f0000000000000040");
//!
//! let hit = source.select_geometry("Parcels", "ParcelID", "A1").await?;
//! assert!(hit.is_some());
//! assert_eq!(source.lookups().len(), 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::storage::{DestinationStore, GeometrySource, SourceStore, StorageError, StorageResult};
use crate::types::{Coordinates, GeometryOutputRow, LinkRecord, TableMetadata};

// ============================================================================
// Mock Source Store
// ============================================================================

#[derive(Debug, Default)]
struct MockSourceState {
    tables: Vec<TableMetadata>,
    links: Vec<LinkRecord>,
    updates: Vec<(String, Coordinates)>,
    failing_updates: HashSet<String>,
    fetch_error: Option<String>,
    fetch_calls: usize,
}

/// Document store backed by two vectors
#[derive(Debug, Clone, Default)]
pub struct MockSourceStore {
    state: Arc<Mutex<MockSourceState>>,
}

impl MockSourceStore {
    pub fn new(tables: Vec<TableMetadata>, links: Vec<LinkRecord>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            state.tables = tables;
            state.links = links;
        }
        store
    }

    /// Every successful `update_coordinates` call, in order
    pub fn updates(&self) -> Vec<(String, Coordinates)> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Current state of the stored link documents
    pub fn links(&self) -> Vec<LinkRecord> {
        self.state.lock().unwrap().links.clone()
    }

    /// Number of fetch calls of either kind
    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    /// Make updates to `id` fail
    pub fn fail_update_for(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert(id.to_string());
    }

    /// Make both fetches fail with `message`
    pub fn set_fetch_error(&self, message: Option<&str>) {
        self.state.lock().unwrap().fetch_error = message.map(str::to_string);
    }
}

#[async_trait]
impl SourceStore for MockSourceStore {
    async fn fetch_table_metadata(&self, limit: usize) -> StorageResult<Vec<TableMetadata>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if let Some(message) = &state.fetch_error {
            return Err(StorageError::query(message.clone()));
        }
        Ok(state.tables.iter().take(limit).cloned().collect())
    }

    async fn fetch_link_records(&self, limit: usize) -> StorageResult<Vec<LinkRecord>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if let Some(message) = &state.fetch_error {
            return Err(StorageError::query(message.clone()));
        }
        Ok(state.links.iter().take(limit).cloned().collect())
    }

    async fn update_coordinates(&self, id: &str, coordinates: Coordinates) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(id) {
            return Err(StorageError::query(format!("update of {} rejected", id)));
        }
        match state.links.iter_mut().find(|l| l.id == id) {
            Some(link) => link.set_coordinates(coordinates),
            None => return Err(StorageError::NotFound(id.to_string())),
        }
        state.updates.push((id.to_string(), coordinates));
        Ok(())
    }
}

// ============================================================================
// Mock Geometry Source
// ============================================================================

type LookupKey = (String, String, String);

#[derive(Debug, Default)]
struct MockGeometryState {
    geometries: HashMap<LookupKey, String>,
    lookups: Vec<LookupKey>,
    lookup_error: Option<String>,
}

/// Geometry lookups answered from a map keyed by (table, field, value)
#[derive(Debug, Clone, Default)]
pub struct MockGeometrySource {
    state: Arc<Mutex<MockGeometryState>>,
}

impl MockGeometrySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_geometry(&self, table: &str, field: &str, value: &str, hex_geometry: &str) {
        self.state.lock().unwrap().geometries.insert(
            (table.to_string(), field.to_string(), value.to_string()),
            hex_geometry.to_string(),
        );
    }

    /// Every lookup issued, in order
    pub fn lookups(&self) -> Vec<LookupKey> {
        self.state.lock().unwrap().lookups.clone()
    }

    /// Make every lookup fail with `message`
    pub fn set_lookup_error(&self, message: Option<&str>) {
        self.state.lock().unwrap().lookup_error = message.map(str::to_string);
    }
}

#[async_trait]
impl GeometrySource for MockGeometrySource {
    async fn select_geometry(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Option<String>> {
        let mut state = self.state.lock().unwrap();
        let key = (table.to_string(), field.to_string(), value.to_string());
        state.lookups.push(key.clone());
        if let Some(message) = &state.lookup_error {
            return Err(StorageError::query(message.clone()));
        }
        Ok(state.geometries.get(&key).cloned())
    }
}

// ============================================================================
// Mock Destination Store
// ============================================================================

/// Call counters for [`MockDestinationStore`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDestinationStats {
    pub truncate_count: usize,
    pub insert_count: usize,
    pub batch_count: usize,
    pub replace_count: usize,
}

#[derive(Debug, Default)]
struct MockDestinationState {
    rows: Vec<GeometryOutputRow>,
    stats: MockDestinationStats,
    fail_truncate: bool,
    /// Inserts fail once this many rows are stored
    fail_after_rows: Option<usize>,
}

/// Output table held in a vector
#[derive(Debug, Clone, Default)]
pub struct MockDestinationStore {
    state: Arc<Mutex<MockDestinationState>>,
}

impl MockDestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with rows from an earlier run
    pub fn with_rows(rows: Vec<GeometryOutputRow>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().rows = rows;
        store
    }

    pub fn rows(&self) -> Vec<GeometryOutputRow> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn stats(&self) -> MockDestinationStats {
        self.state.lock().unwrap().stats.clone()
    }

    pub fn set_fail_truncate(&self, fail: bool) {
        self.state.lock().unwrap().fail_truncate = fail;
    }

    /// Fail inserts once `rows` rows are stored
    pub fn fail_after_rows(&self, rows: Option<usize>) {
        self.state.lock().unwrap().fail_after_rows = rows;
    }

    fn push(state: &mut MockDestinationState, row: &GeometryOutputRow) -> StorageResult<()> {
        if state.fail_after_rows.is_some_and(|n| state.rows.len() >= n) {
            return Err(StorageError::query("destination full"));
        }
        state.rows.push(row.clone());
        Ok(())
    }
}

#[async_trait]
impl DestinationStore for MockDestinationStore {
    async fn truncate(&self) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.stats.truncate_count += 1;
        if state.fail_truncate {
            return Err(StorageError::query("truncate rejected"));
        }
        state.rows.clear();
        Ok(())
    }

    async fn insert(&self, row: &GeometryOutputRow) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.stats.insert_count += 1;
        Self::push(&mut state, row)
    }

    async fn insert_batch(&self, rows: &[GeometryOutputRow]) -> StorageResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.stats.batch_count += 1;
        for row in rows {
            Self::push(&mut state, row)?;
        }
        Ok(rows.len())
    }

    /// All-or-nothing: on failure the previous rows are restored
    async fn replace_all(
        &self,
        rows: &[GeometryOutputRow],
        batch_size: usize,
    ) -> StorageResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.stats.replace_count += 1;
        if state.fail_truncate {
            return Err(StorageError::Transaction("truncate rejected".to_string()));
        }
        let previous = std::mem::take(&mut state.rows);
        for chunk in rows.chunks(batch_size.max(1)) {
            state.stats.batch_count += 1;
            for row in chunk {
                if let Err(e) = Self::push(&mut state, row) {
                    state.rows = previous;
                    return Err(StorageError::Transaction(e.to_string()));
                }
            }
        }
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(record_id: &str) -> GeometryOutputRow {
        GeometryOutputRow {
            id: format!("id-{}", record_id),
            table_name: "Parcels".to_string(),
            field_name: "ParcelID".to_string(),
            record_id: record_id.to_string(),
            document_count: 1,
            geometry: "00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_source_update_unknown_id_fails() {
        let store = MockSourceStore::new(vec![], vec![]);
        let result = store
            .update_coordinates("record_link:9", Coordinates::lookup_miss())
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_destination_default_batch_fails_midway() {
        let store = MockDestinationStore::new();
        store.fail_after_rows(Some(1));
        let result = store.insert_batch(&[row("a"), row("b")]).await;
        assert!(result.is_err());
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_destination_replace_all_restores_on_failure() {
        let store = MockDestinationStore::with_rows(vec![row("old")]);
        store.fail_after_rows(Some(2));
        let result = store.replace_all(&[row("a"), row("b"), row("c")], 2).await;
        assert!(matches!(result, Err(StorageError::Transaction(_))));
        assert_eq!(store.rows(), vec![row("old")]);
    }
}

//! Domain records shared by the stores and the pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key value marking a link that was never tied to a record
pub const UNDEFINED_KEY: &str = "undefined";

/// Half-width of the band around the origin that means "not resolved yet"
pub const UNRESOLVED_EPSILON: f64 = 0.1;

/// Written to both axes when a lookup found nothing usable
pub const LOOKUP_MISS_SENTINEL: f64 = 0.1;

/// Static description of a foreign table that link records point into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub id: i64,
    pub database: String,
    pub table: String,
    pub key_field: String,
}

/// Table metadata indexed by id.
///
/// Unknown ids resolve to empty names rather than failing.
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    tables: HashMap<i64, TableMetadata>,
}

impl TableCatalog {
    pub fn new(tables: impl IntoIterator<Item = TableMetadata>) -> Self {
        // Later duplicates overwrite earlier ones
        let tables = tables.into_iter().map(|t| (t.id, t)).collect();
        Self { tables }
    }

    pub fn get(&self, table_id: i64) -> Option<&TableMetadata> {
        self.tables.get(&table_id)
    }

    /// Table name for `table_id`, empty when unknown
    pub fn table_name(&self, table_id: i64) -> &str {
        self.get(table_id).map(|t| t.table.as_str()).unwrap_or("")
    }

    /// Key field for `table_id`, empty when unknown
    pub fn key_field(&self, table_id: i64) -> &str {
        self.get(table_id).map(|t| t.key_field.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// A (longitude, latitude) pair in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Marker written after a lookup that produced nothing
    pub fn lookup_miss() -> Self {
        Self::new(LOOKUP_MISS_SENTINEL, LOOKUP_MISS_SENTINEL)
    }

    /// Both axes inside the open band (-0.1, 0.1)
    pub fn is_unresolved(&self) -> bool {
        self.lat.abs() < UNRESOLVED_EPSILON && self.lon.abs() < UNRESOLVED_EPSILON
    }
}

/// One document-to-record link from the source store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Opaque identifier in the source store
    pub id: String,
    pub table_id: i64,
    pub key_value: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LinkRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.longitude, self.latitude)
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.longitude = coordinates.lon;
        self.latitude = coordinates.lat;
    }

    pub fn is_unresolved(&self) -> bool {
        self.coordinates().is_unresolved()
    }

    pub fn is_undefined_key(&self) -> bool {
        self.key_value == UNDEFINED_KEY
    }
}

/// A row of the destination table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryOutputRow {
    pub id: String,
    pub table_name: String,
    pub field_name: String,
    pub record_id: String,
    pub document_count: i64,
    /// Hex EWKB point
    pub geometry: String,
}

impl GeometryOutputRow {
    /// Build the output row for a representative record, with a fresh id
    pub fn for_record(
        record: &LinkRecord,
        catalog: &TableCatalog,
        document_count: usize,
        geometry: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            table_name: catalog.table_name(record.table_id).to_string(),
            field_name: catalog.key_field(record.table_id).to_string(),
            record_id: record.key_value.clone(),
            document_count: document_count as i64,
            geometry,
        }
    }
}

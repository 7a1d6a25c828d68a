//! `SourceStore` over SurrealDB tables
//!
//! Table metadata documents carry `db`, `table` and `keyField`, keyed by a
//! numeric record id. Link documents carry `tableID`, `keyValue`, `lat` and
//! `lon`. Snake-case field names are accepted as well.

use crate::error::{SurrealError, SurrealResult};
use crate::surreal_client::{Document, SurrealClient};
use async_trait::async_trait;
use docgeom_config::SourceStoreConfig;
use docgeom_core::{Coordinates, LinkRecord, SourceStore, StorageResult, TableMetadata};
use serde_json::{json, Value};
use tracing::{debug, warn};

const SELECT_WITH_KEY: &str = "SELECT *, meta::id(id) AS record_key FROM type::table($table) LIMIT $limit";

const UPDATE_COORDINATES: &str =
    "UPDATE type::thing($table, $key) MERGE { lat: $lat, lon: $lon } RETURN meta::id(id) AS record_key";

/// Document store reading metadata and link tables from SurrealDB
#[derive(Debug, Clone)]
pub struct SurrealSourceStore {
    client: SurrealClient,
    table_meta_table: String,
    record_link_table: String,
}

impl SurrealSourceStore {
    pub fn new(client: SurrealClient, config: &SourceStoreConfig) -> Self {
        Self {
            client,
            table_meta_table: config.table_meta_table.clone(),
            record_link_table: config.record_link_table.clone(),
        }
    }

    /// Connect using `config` and wrap the client
    pub async fn connect(config: &SourceStoreConfig) -> SurrealResult<Self> {
        let client = SurrealClient::connect(config).await?;
        Ok(Self::new(client, config))
    }

    pub fn client(&self) -> &SurrealClient {
        &self.client
    }

    async fn select_all(&self, table: &str, limit: usize) -> SurrealResult<Vec<Document>> {
        self.client
            .query(SELECT_WITH_KEY, &[json!({ "table": table, "limit": limit })])
            .await
    }
}

#[async_trait]
impl SourceStore for SurrealSourceStore {
    async fn fetch_table_metadata(&self, limit: usize) -> StorageResult<Vec<TableMetadata>> {
        let documents = self.select_all(&self.table_meta_table, limit).await?;
        let mut tables = Vec::with_capacity(documents.len());
        for document in &documents {
            match table_metadata_from(document) {
                Some(table) => tables.push(table),
                None => warn!(
                    table = %self.table_meta_table,
                    key = ?document.get("record_key"),
                    "Skipping table metadata without a numeric id"
                ),
            }
        }
        debug!(count = tables.len(), "Fetched table metadata");
        Ok(tables)
    }

    async fn fetch_link_records(&self, limit: usize) -> StorageResult<Vec<LinkRecord>> {
        let documents = self.select_all(&self.record_link_table, limit).await?;
        let mut records = Vec::with_capacity(documents.len());
        for document in &documents {
            match link_record_from(&self.record_link_table, document) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    table = %self.record_link_table,
                    key = ?document.get("record_key"),
                    error = %e,
                    "Skipping malformed link record"
                ),
            }
        }
        debug!(count = records.len(), "Fetched link records");
        Ok(records)
    }

    async fn update_coordinates(&self, id: &str, coordinates: Coordinates) -> StorageResult<()> {
        let (table, key) = split_record_id(id, &self.record_link_table);
        let updated = self
            .client
            .query(
                UPDATE_COORDINATES,
                &[json!({
                    "table": table,
                    "key": key,
                    "lat": coordinates.lat,
                    "lon": coordinates.lon,
                })],
            )
            .await?;
        if updated.is_empty() {
            return Err(docgeom_core::StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn field<'a>(document: &'a Document, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| document.get(name))
}

fn string_field(document: &Document, names: &[&str]) -> String {
    match field(document, names) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn table_metadata_from(document: &Document) -> Option<TableMetadata> {
    let id = document.get("record_key").and_then(as_i64)?;
    Some(TableMetadata {
        id,
        database: string_field(document, &["db", "database"]),
        table: string_field(document, &["table"]),
        key_field: string_field(document, &["keyField", "key_field"]),
    })
}

fn link_record_from(table: &str, document: &Document) -> SurrealResult<LinkRecord> {
    let malformed = |message: &str| SurrealError::Document {
        table: table.to_string(),
        message: message.to_string(),
    };

    let key = match document.get("record_key") {
        // Bracketed, or it would be bound back as a numeric key
        Some(Value::String(s)) if s.parse::<i64>().is_ok() => format!("⟨{}⟩", s),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(malformed("missing record id")),
    };
    let table_id = field(document, &["tableID", "table_id"])
        .and_then(as_i64)
        .ok_or_else(|| malformed(&format!("record {} has no tableID", key)))?;

    // Absent coordinates read as 0, which marks the record as unresolved
    let coordinate = |names: &[&str]| field(document, names).and_then(Value::as_f64).unwrap_or(0.0);

    Ok(LinkRecord {
        id: format!("{}:{}", table, key),
        table_id,
        key_value: string_field(document, &["keyValue", "key_value"]),
        latitude: coordinate(&["lat", "latitude"]),
        longitude: coordinate(&["lon", "longitude"]),
    })
}

/// Split `table:key` into a table name and a bindable key.
///
/// A bracketed key (`⟨007⟩`) is always a string. Bare integer keys are bound
/// as numbers. An id without a table prefix is taken as a key of
/// `default_table`.
fn split_record_id(id: &str, default_table: &str) -> (String, Value) {
    let (table, key) = match id.split_once(':') {
        Some((table, key)) if !table.is_empty() => (table.to_string(), key),
        _ => (default_table.to_string(), id),
    };
    if let Some(inner) = key.strip_prefix('⟨').and_then(|k| k.strip_suffix('⟩')) {
        return (table, Value::String(inner.to_string()));
    }
    let key = match key.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(key.to_string()),
    };
    (table, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(data) => Document { id: None, data },
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_split_record_id() {
        assert_eq!(
            split_record_id("record_link:42", "x"),
            ("record_link".to_string(), json!(42))
        );
        assert_eq!(
            split_record_id("record_link:5f1a9c", "x"),
            ("record_link".to_string(), json!("5f1a9c"))
        );
        assert_eq!(
            split_record_id("record_link:⟨a-b⟩", "x"),
            ("record_link".to_string(), json!("a-b"))
        );
        assert_eq!(split_record_id("abc", "links"), ("links".to_string(), json!("abc")));
    }

    #[test]
    fn test_numeric_looking_string_key_stays_a_string() {
        assert_eq!(
            split_record_id("record_link:⟨007⟩", "x"),
            ("record_link".to_string(), json!("007"))
        );
        assert_eq!(
            split_record_id("record_link:⟨42⟩", "x"),
            ("record_link".to_string(), json!("42"))
        );

        let string_key = link_record_from(
            "record_link",
            &document(json!({"record_key": "007", "tableID": 1, "keyValue": "A"})),
        )
        .unwrap();
        assert_eq!(string_key.id, "record_link:⟨007⟩");
        assert_eq!(
            split_record_id(&string_key.id, "x"),
            ("record_link".to_string(), json!("007"))
        );

        let numeric_key = link_record_from(
            "record_link",
            &document(json!({"record_key": 7, "tableID": 1, "keyValue": "A"})),
        )
        .unwrap();
        assert_eq!(numeric_key.id, "record_link:7");
        assert_eq!(
            split_record_id(&numeric_key.id, "x"),
            ("record_link".to_string(), json!(7))
        );
    }

    #[test]
    fn test_link_record_from_legacy_fields() {
        let record = link_record_from(
            "record_link",
            &document(json!({
                "record_key": "5f1a9c",
                "tableID": 3,
                "keyValue": "A123",
                "lat": -26.2,
                "lon": 28
            })),
        )
        .unwrap();
        assert_eq!(record.id, "record_link:5f1a9c");
        assert_eq!(record.table_id, 3);
        assert_eq!(record.key_value, "A123");
        assert_eq!(record.coordinates(), Coordinates::new(28.0, -26.2));
    }

    #[test]
    fn test_link_record_without_coordinates_is_unresolved() {
        let record = link_record_from(
            "record_link",
            &document(json!({"record_key": 1, "tableID": 1, "keyValue": "A"})),
        )
        .unwrap();
        assert!(record.is_unresolved());
    }

    #[test]
    fn test_link_record_without_table_id_is_malformed() {
        let err = link_record_from("record_link", &document(json!({"record_key": 1, "keyValue": "A"})))
            .unwrap_err();
        assert!(matches!(err, SurrealError::Document { .. }));
    }

    #[test]
    fn test_table_metadata_requires_numeric_key() {
        let meta = table_metadata_from(&document(json!({
            "record_key": 2, "db": "gis", "table": "Parcels", "keyField": "ParcelID"
        })))
        .unwrap();
        assert_eq!(meta.id, 2);
        assert_eq!(meta.key_field, "ParcelID");

        assert!(table_metadata_from(&document(json!({"record_key": "abc", "table": "T"}))).is_none());
    }
}

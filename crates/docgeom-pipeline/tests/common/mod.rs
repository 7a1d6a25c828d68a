//! Common test utilities for pipeline tests.

#![allow(dead_code)]

use docgeom_config::{RelationalConfig, SourceStoreConfig};
use docgeom_core::ewkb::{decode_hex, encode_hex, ByteOrder, Coord, Geometry, Layout, Shape, SRID_WGS84};
use docgeom_core::{Coordinates, LinkRecord, TableMetadata};
use docgeom_sqlite::SqliteRelationalStore;
use docgeom_surrealdb::SurrealSourceStore;
use serde_json::json;

pub fn source_config(host: &str) -> SourceStoreConfig {
    SourceStoreConfig {
        host: host.to_string(),
        namespace: "docs".to_string(),
        database: "docs".to_string(),
        username: None,
        password: None,
        table_meta_table: "table_meta".to_string(),
        record_link_table: "record_link".to_string(),
        table_meta_limit: 100,
        record_link_limit: 1000,
    }
}

pub fn parcels() -> TableMetadata {
    TableMetadata {
        id: 1,
        database: "gis".to_string(),
        table: "Parcels".to_string(),
        key_field: "ParcelID".to_string(),
    }
}

pub fn link(id: &str, table_id: i64, key: &str, lat: f64, lon: f64) -> LinkRecord {
    LinkRecord {
        id: id.to_string(),
        table_id,
        key_value: key.to_string(),
        latitude: lat,
        longitude: lon,
    }
}

/// 0.2 degree square whose centroid is (28.1, -26.1)
pub fn parcel_polygon_hex() -> String {
    let ring = vec![
        Coord::xy(28.0, -26.0),
        Coord::xy(28.2, -26.0),
        Coord::xy(28.2, -26.2),
        Coord::xy(28.0, -26.2),
        Coord::xy(28.0, -26.0),
    ];
    encode_hex(
        &Geometry::new(Layout::XY, Shape::Polygon(vec![ring])).with_srid(SRID_WGS84),
        ByteOrder::Ndr,
    )
}

/// Decode an output geometry back into coordinates, checking SRID and layout
pub fn decode_output_point(hex_geometry: &str) -> Coordinates {
    let geometry = decode_hex(hex_geometry).expect("output geometry decodes");
    assert_eq!(geometry.srid, Some(SRID_WGS84));
    assert_eq!(geometry.layout, Layout::XYZ);
    let c = geometry.first_coord().expect("output point has coordinates");
    Coordinates::new(c.x, c.y)
}

pub fn assert_close(actual: Coordinates, lon: f64, lat: f64) {
    assert!(
        (actual.lon - lon).abs() < 1e-9 && (actual.lat - lat).abs() < 1e-9,
        "expected ({}, {}), got {:?}",
        lon,
        lat,
        actual
    );
}

/// Seed table metadata and link documents into a SurrealDB source
pub async fn seed_source(store: &SurrealSourceStore, tables: &[TableMetadata], links: &[(&str, LinkRecord)]) {
    for table in tables {
        store
            .client()
            .query(
                "CREATE type::thing('table_meta', $id) CONTENT { db: $db, table: $table, keyField: $key_field }",
                &[json!({
                    "id": table.id,
                    "db": table.database,
                    "table": table.table,
                    "key_field": table.key_field,
                })],
            )
            .await
            .expect("seed table metadata");
    }
    for (key, link) in links {
        store
            .client()
            .query(
                "CREATE type::thing('record_link', $key) CONTENT { tableID: $table_id, keyValue: $key_value, lat: $lat, lon: $lon }",
                &[json!({
                    "key": key,
                    "table_id": link.table_id,
                    "key_value": link.key_value,
                    "lat": link.latitude,
                    "lon": link.longitude,
                })],
            )
            .await
            .expect("seed link record");
    }
}

/// In-memory SQLite store with an empty `Parcels` geometry table
pub fn relational_store() -> SqliteRelationalStore {
    let store = SqliteRelationalStore::open(&RelationalConfig::sqlite(":memory:"))
        .expect("open in-memory sqlite");
    store
        .create_geometry_table("Parcels", "ParcelID")
        .expect("create geometry table");
    store
}

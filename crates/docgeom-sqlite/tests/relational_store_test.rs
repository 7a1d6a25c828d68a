//! SqliteRelationalStore opened from configuration

use docgeom_config::RelationalConfig;
use docgeom_core::{DestinationStore, GeometryOutputRow, GeometrySource};
use docgeom_sqlite::{schema, SqliteRelationalStore};
use tempfile::TempDir;

fn row(record_id: &str) -> GeometryOutputRow {
    GeometryOutputRow {
        id: format!("id-{}", record_id),
        table_name: "Parcels".to_string(),
        field_name: "ParcelID".to_string(),
        record_id: record_id.to_string(),
        document_count: 1,
        geometry: "01010000a0e61000000000000000003c403333333333333ac00000000000000000"
            .to_string(),
    }
}

#[tokio::test]
async fn rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = RelationalConfig::sqlite(dir.path().join("out.db").to_string_lossy());

    {
        let store = SqliteRelationalStore::open(&config).unwrap();
        store.insert_batch(&[row("A"), row("B")]).await.unwrap();
    }

    let store = SqliteRelationalStore::open(&config).unwrap();
    assert_eq!(store.output_rows().unwrap().len(), 2);
    let version = store
        .pool()
        .with_connection(|conn| schema::get_current_version(conn, "DocumentGeometry"))
        .unwrap();
    assert_eq!(version, 2);
}

#[tokio::test]
async fn custom_output_table_and_geometry_column() {
    let mut config = RelationalConfig::sqlite(":memory:");
    config.output_table = "doc_geom".to_string();
    config.geometry_column = "geom".to_string();

    let store = SqliteRelationalStore::open(&config).unwrap();
    store.create_geometry_table("Erven", "Erf No").unwrap();
    store
        .insert_geometry("Erven", "Erf No", "1024", "0101000000")
        .unwrap();

    assert_eq!(
        store.select_geometry("Erven", "Erf No", "1024").await.unwrap(),
        Some("0101000000".to_string())
    );

    store.replace_all(&[row("A")], 500).await.unwrap();
    let count: i64 = store
        .pool()
        .with_connection(|conn| {
            Ok(conn.query_row(r#"SELECT COUNT(*) FROM "doc_geom""#, [], |r| r.get(0))?)
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn quote_in_table_name_cannot_escape() {
    let mut config = RelationalConfig::sqlite(":memory:");
    config.output_table = r#"out"; DROP TABLE x; --"#.to_string();
    let store = SqliteRelationalStore::open(&config).unwrap();
    assert!(store.output_rows().unwrap().is_empty());
}

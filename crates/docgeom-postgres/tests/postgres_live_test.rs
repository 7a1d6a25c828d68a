//! Tests against a live PostGIS server.
//!
//! Enabled with `--features test-infrastructure`; connection settings come
//! from `DOCGEOM_TEST_POSTGRES_{HOST,PORT,USER,PASSWORD,DATABASE}`.

#![cfg(feature = "test-infrastructure")]

use docgeom_config::{RelationalConfig, RelationalDriver};
use docgeom_core::{DestinationStore, GeometryOutputRow, GeometrySource};
use docgeom_postgres::PostgresRelationalStore;

fn env(name: &str, default: &str) -> String {
    std::env::var(format!("DOCGEOM_TEST_POSTGRES_{}", name)).unwrap_or_else(|_| default.to_string())
}

fn config(output_table: &str) -> RelationalConfig {
    RelationalConfig {
        driver: RelationalDriver::Postgres,
        host: env("HOST", "localhost"),
        port: env("PORT", "5432").parse().unwrap(),
        database: env("DATABASE", "postgres"),
        user: env("USER", "postgres"),
        password: env("PASSWORD", "postgres"),
        ssl: false,
        output_table: output_table.to_string(),
        geometry_column: "Geometry".to_string(),
        connect_timeout_seconds: 5,
    }
}

fn row(record_id: &str) -> GeometryOutputRow {
    GeometryOutputRow {
        id: uuid::Uuid::new_v4().to_string(),
        table_name: "Parcels".to_string(),
        field_name: "ParcelID".to_string(),
        record_id: record_id.to_string(),
        document_count: 1,
        geometry: "01010000a0e61000000000000000003c403333333333333ac00000000000000000"
            .to_string(),
    }
}

async fn store_with_tables() -> (PostgresRelationalStore, String, String) {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let output = format!("DocumentGeometry_{}", suffix);
    let parcels = format!("Parcels_{}", suffix);
    let store = PostgresRelationalStore::connect(&config(&output)).await.unwrap();

    sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query(&format!(
        r#"CREATE TABLE "{}" ("ID" text PRIMARY KEY, "TableName" text, "FieldName" text,
           "RecordID" text, "DocumentCount" integer, "Geometry" geometry(PointZ, 4326))"#,
        output
    ))
    .execute(store.pool())
    .await
    .unwrap();
    sqlx::query(&format!(
        r#"CREATE TABLE "{}" ("ParcelID" integer, "Geometry" geometry)"#,
        parcels
    ))
    .execute(store.pool())
    .await
    .unwrap();
    sqlx::query(&format!(
        r#"INSERT INTO "{}" VALUES (1024, ST_GeomFromText('POLYGON((0 0,4 0,4 2,0 2,0 0))', 4326))"#,
        parcels
    ))
    .execute(store.pool())
    .await
    .unwrap();

    (store, output, parcels)
}

async fn drop_tables(store: &PostgresRelationalStore, tables: &[&str]) {
    for table in tables {
        sqlx::query(&format!(r#"DROP TABLE IF EXISTS "{}""#, table))
            .execute(store.pool())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn lookup_returns_hex_ewkb() {
    let (store, output, parcels) = store_with_tables().await;

    let hit = store
        .select_geometry(&parcels, "ParcelID", "1024")
        .await
        .unwrap()
        .unwrap();
    let geometry = docgeom_core::ewkb::decode_hex(&hit).unwrap();
    assert_eq!(geometry.srid, Some(4326));

    assert_eq!(
        store.select_geometry(&parcels, "ParcelID", "9").await.unwrap(),
        None
    );

    drop_tables(&store, &[&output, &parcels]).await;
}

#[tokio::test]
async fn replace_all_is_atomic() {
    let (store, output, parcels) = store_with_tables().await;

    store.insert_batch(&[row("old")]).await.unwrap();
    let mut duplicate = row("B");
    let first = row("A");
    duplicate.id = first.id.clone();
    assert!(store.replace_all(&[first, duplicate], 10).await.is_err());

    let count: i64 = sqlx::query_scalar(&format!(r#"SELECT COUNT(*) FROM "{}""#, output))
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    store.truncate().await.unwrap();
    assert_eq!(store.insert_batch(&[row("A"), row("B")]).await.unwrap(), 2);

    drop_tables(&store, &[&output, &parcels]).await;
}

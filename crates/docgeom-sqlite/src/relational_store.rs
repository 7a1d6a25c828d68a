//! `GeometrySource` and `DestinationStore` over SQLite

use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};
use crate::schema::OutputTable;
use async_trait::async_trait;
use docgeom_config::RelationalConfig;
use docgeom_core::{
    quote_identifier, DestinationStore, GeometryOutputRow, GeometrySource, StorageError,
    StorageResult,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::time::Duration;
use tracing::debug;

const OUTPUT_COLUMNS: usize = 6;

/// Rows per multi-row INSERT, kept under SQLite's historical 999-variable limit
const ROWS_PER_STATEMENT: usize = 999 / OUTPUT_COLUMNS;

/// SQLite database holding geometry tables and the output table
#[derive(Debug, Clone)]
pub struct SqliteRelationalStore {
    pool: SqlitePool,
    output: OutputTable,
}

impl SqliteRelationalStore {
    /// Open `config.database` as a file path (or `:memory:`)
    pub fn open(config: &RelationalConfig) -> SqliteResult<Self> {
        let output = OutputTable::new(&config.output_table, &config.geometry_column)?;
        let pool = SqlitePool::open(
            &config.database,
            &output,
            Duration::from_secs(config.connect_timeout_seconds),
        )?;
        Ok(Self { pool, output })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a geometry table keyed by `key_field`, for fixtures and local runs
    pub fn create_geometry_table(&self, table: &str, key_field: &str) -> SqliteResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} TEXT NOT NULL, {} TEXT)",
            quote_identifier(table)?,
            quote_identifier(key_field)?,
            self.output.geometry_column,
        );
        self.pool.with_connection(|conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
    }

    /// Store a hex EWKB geometry under `key`
    pub fn insert_geometry(
        &self,
        table: &str,
        key_field: &str,
        key: &str,
        hex_geometry: &str,
    ) -> SqliteResult<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            quote_identifier(table)?,
            quote_identifier(key_field)?,
            self.output.geometry_column,
        );
        self.pool.with_connection(|conn| {
            conn.execute(&sql, [key, hex_geometry])?;
            Ok(())
        })
    }

    /// Every output row, ordered by table name and record id
    pub fn output_rows(&self) -> SqliteResult<Vec<GeometryOutputRow>> {
        let sql = format!(
            r#"SELECT "ID", "TableName", "FieldName", "RecordID", "DocumentCount", {}
               FROM {} ORDER BY "TableName", "RecordID""#,
            self.output.geometry_column, self.output.table,
        );
        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(GeometryOutputRow {
                        id: row.get(0)?,
                        table_name: row.get(1)?,
                        field_name: row.get(2)?,
                        record_id: row.get(3)?,
                        document_count: row.get(4)?,
                        geometry: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    async fn blocking<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&SqlitePool, &OutputTable) -> SqliteResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let output = self.output.clone();
        tokio::task::spawn_blocking(move || f(&pool, &output))
            .await
            .map_err(|e| StorageError::from(SqliteError::Task(e.to_string())))?
            .map_err(Into::into)
    }
}

fn insert_rows(
    conn: &Connection,
    output: &OutputTable,
    rows: &[GeometryOutputRow],
) -> SqliteResult<usize> {
    let mut written = 0;
    for chunk in rows.chunks(ROWS_PER_STATEMENT) {
        let placeholders = vec!["(?, ?, ?, ?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            r#"INSERT INTO {} ("ID", "TableName", "FieldName", "RecordID", "DocumentCount", {}) VALUES {}"#,
            output.table, output.geometry_column, placeholders,
        );
        let values = chunk.iter().flat_map(|row| {
            [
                Value::Text(row.id.clone()),
                Value::Text(row.table_name.clone()),
                Value::Text(row.field_name.clone()),
                Value::Text(row.record_id.clone()),
                Value::Integer(row.document_count),
                Value::Text(row.geometry.clone()),
            ]
        });
        written += conn.execute(&sql, params_from_iter(values))?;
    }
    Ok(written)
}

fn delete_all(conn: &Connection, output: &OutputTable) -> SqliteResult<usize> {
    Ok(conn.execute(&format!("DELETE FROM {}", output.table), [])?)
}

#[async_trait]
impl GeometrySource for SqliteRelationalStore {
    async fn select_geometry(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Option<String>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
            self.output.geometry_column,
            quote_identifier(table)?,
            quote_identifier(field)?,
        );
        let value = value.to_string();

        self.blocking(move |pool, _| {
            pool.with_connection(|conn| {
                let geometry: Option<Value> = conn
                    .query_row(&sql, [&value], |row| row.get(0))
                    .optional()?;
                // Raw WKB blobs are hex encoded like PostGIS text output
                Ok(match geometry {
                    Some(Value::Text(s)) => Some(s),
                    Some(Value::Blob(bytes)) => Some(hex::encode(bytes)),
                    _ => None,
                })
            })
        })
        .await
    }
}

#[async_trait]
impl DestinationStore for SqliteRelationalStore {
    async fn truncate(&self) -> StorageResult<()> {
        self.blocking(|pool, output| {
            pool.with_connection(|conn| {
                let removed = delete_all(conn, output)?;
                debug!(table = %output.name, removed, "Truncated output table");
                Ok(())
            })
        })
        .await
    }

    async fn insert(&self, row: &GeometryOutputRow) -> StorageResult<()> {
        self.insert_batch(std::slice::from_ref(row)).await.map(|_| ())
    }

    async fn insert_batch(&self, rows: &[GeometryOutputRow]) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = rows.to_vec();
        self.blocking(move |pool, output| {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                let written = insert_rows(&tx, output, &rows)?;
                tx.commit()?;
                Ok(written)
            })
        })
        .await
    }

    /// Delete and insert in one transaction; on failure the old rows remain
    async fn replace_all(
        &self,
        rows: &[GeometryOutputRow],
        batch_size: usize,
    ) -> StorageResult<usize> {
        let rows = rows.to_vec();
        let batch_size = batch_size.max(1);
        self.blocking(move |pool, output| {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                delete_all(&tx, output)?;
                let mut written = 0;
                for chunk in rows.chunks(batch_size) {
                    written += insert_rows(&tx, output, chunk)?;
                }
                tx.commit()?;
                Ok(written)
            })
        })
        .await
    }
}

//! Schema management and migrations
//!
//! The output table name is configurable, so migrations are versioned per
//! table in `schema_migrations`.

use crate::error::{SqliteError, SqliteResult};
use docgeom_core::quote_identifier;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 2;

/// Quoted names of the output table and its geometry column
#[derive(Debug, Clone)]
pub struct OutputTable {
    pub name: String,
    pub table: String,
    pub geometry_column: String,
}

impl OutputTable {
    pub fn new(name: &str, geometry_column: &str) -> SqliteResult<Self> {
        Ok(Self {
            name: name.to_string(),
            table: quote_identifier(name)?,
            geometry_column: quote_identifier(geometry_column)?,
        })
    }
}

/// Apply all pending migrations for `output`
pub fn apply_migrations(conn: &Connection, output: &OutputTable) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            table_name TEXT NOT NULL,
            version INTEGER NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (table_name, version)
        );",
    )?;

    let current_version = get_current_version(conn, &output.name)?;
    debug!(
        table = %output.name,
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking migrations"
    );

    if current_version < SCHEMA_VERSION {
        info!(
            table = %output.name,
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
    }
    if current_version < 1 {
        apply_migration_v1(conn, output)?;
    }
    if current_version < 2 {
        apply_migration_v2(conn, output)?;
    }

    Ok(())
}

/// Get current schema version of `table_name`
pub fn get_current_version(conn: &Connection, table_name: &str) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row(
            "SELECT MAX(version) FROM schema_migrations WHERE table_name = ?1",
            [table_name],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, table_name: &str, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (table_name, version) VALUES (?1, ?2)",
        params![table_name, version],
    )?;
    Ok(())
}

/// Migration v1: the output table
fn apply_migration_v1(conn: &Connection, output: &OutputTable) -> SqliteResult<()> {
    debug!(table = %output.name, "Applying migration v1: output table");

    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            "ID" TEXT PRIMARY KEY NOT NULL,
            "TableName" TEXT NOT NULL,
            "FieldName" TEXT NOT NULL,
            "RecordID" TEXT NOT NULL,
            "DocumentCount" INTEGER NOT NULL CHECK ("DocumentCount" >= 1),
            {geometry} TEXT NOT NULL
        );
        "#,
        table = output.table,
        geometry = output.geometry_column,
    );
    conn.execute_batch(&sql)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, &output.name, 1)?;
    Ok(())
}

/// Migration v2: lookup index on the natural key
fn apply_migration_v2(conn: &Connection, output: &OutputTable) -> SqliteResult<()> {
    debug!(table = %output.name, "Applying migration v2: record index");

    let index = quote_identifier(&format!("idx_{}_record", output.name))?;
    let sql = format!(
        r#"CREATE INDEX IF NOT EXISTS {index} ON {table} ("TableName", "RecordID");"#,
        index = index,
        table = output.table,
    );
    conn.execute_batch(&sql)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v2 schema: {}", e)))?;

    record_migration(conn, &output.name, 2)?;
    Ok(())
}

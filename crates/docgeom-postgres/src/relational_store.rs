//! `GeometrySource` and `DestinationStore` over PostgreSQL/PostGIS

use crate::connection;
use crate::error::{PostgresError, PostgresResult};
use async_trait::async_trait;
use docgeom_config::RelationalConfig;
use docgeom_core::{
    quote_identifier, DestinationStore, GeometryOutputRow, GeometrySource, StorageResult,
};
use sqlx::postgres::PgPool;
use sqlx::{Executor, Postgres, QueryBuilder};
use tracing::debug;

/// Postgres caps bind parameters per statement at 65535
const ROWS_PER_STATEMENT: usize = 1000;

/// PostGIS database holding geometry tables and the output table
#[derive(Debug, Clone)]
pub struct PostgresRelationalStore {
    pool: PgPool,
    output_table: String,
    geometry_column: String,
}

impl PostgresRelationalStore {
    pub fn new(pool: PgPool, config: &RelationalConfig) -> PostgresResult<Self> {
        Ok(Self {
            pool,
            output_table: quote_identifier(&config.output_table)?,
            geometry_column: quote_identifier(&config.geometry_column)?,
        })
    }

    /// Connect using `config`
    pub async fn connect(config: &RelationalConfig) -> PostgresResult<Self> {
        let pool = connection::connect(config).await?;
        Self::new(pool, config)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn truncate_sql(&self) -> String {
        format!("TRUNCATE {}", self.output_table)
    }

    fn insert_builder(&self, rows: &[GeometryOutputRow]) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!(
            r#"INSERT INTO {} ("ID", "TableName", "FieldName", "RecordID", "DocumentCount", {}) "#,
            self.output_table, self.geometry_column
        ));
        builder.push_values(rows.iter().cloned(), |mut b, row| {
            b.push_bind(row.id)
                .push_bind(row.table_name)
                .push_bind(row.field_name)
                .push_bind(row.record_id)
                .push_bind(row.document_count)
                .push_bind(row.geometry);
        });
        builder
    }

    async fn insert_rows<'e, E>(&self, executor: E, rows: &[GeometryOutputRow]) -> PostgresResult<usize>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder = self.insert_builder(rows);
        let result = builder.build().execute(executor).await?;
        Ok(result.rows_affected() as usize)
    }
}

/// Text (hex EWKB) of the geometry column, compared on the key's text form
fn select_geometry_sql(geometry_column: &str, table: &str, field: &str) -> PostgresResult<String> {
    Ok(format!(
        "SELECT {}::text FROM {} WHERE {}::text = $1 LIMIT 1",
        geometry_column,
        quote_identifier(table)?,
        quote_identifier(field)?,
    ))
}

#[async_trait]
impl GeometrySource for PostgresRelationalStore {
    async fn select_geometry(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Option<String>> {
        let sql = select_geometry_sql(&self.geometry_column, table, field)?;
        let geometry: Option<Option<String>> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(geometry.flatten())
    }
}

#[async_trait]
impl DestinationStore for PostgresRelationalStore {
    async fn truncate(&self) -> StorageResult<()> {
        sqlx::query(&self.truncate_sql())
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        debug!(table = %self.output_table, "Truncated output table");
        Ok(())
    }

    async fn insert(&self, row: &GeometryOutputRow) -> StorageResult<()> {
        self.insert_rows(&self.pool, std::slice::from_ref(row)).await?;
        Ok(())
    }

    async fn insert_batch(&self, rows: &[GeometryOutputRow]) -> StorageResult<usize> {
        let mut written = 0;
        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            written += self.insert_rows(&self.pool, chunk).await?;
        }
        Ok(written)
    }

    /// TRUNCATE and INSERTs in one transaction; on failure the old rows remain
    async fn replace_all(
        &self,
        rows: &[GeometryOutputRow],
        batch_size: usize,
    ) -> StorageResult<usize> {
        let batch_size = batch_size.clamp(1, ROWS_PER_STATEMENT);
        let mut tx = self.pool.begin().await.map_err(PostgresError::from)?;

        sqlx::query(&self.truncate_sql())
            .execute(&mut *tx)
            .await
            .map_err(PostgresError::from)?;

        let mut written = 0;
        for chunk in rows.chunks(batch_size) {
            written += self.insert_rows(&mut *tx, chunk).await?;
        }

        tx.commit().await.map_err(PostgresError::from)?;
        Ok(written)
    }
}

//! Document Geometry Pipeline Orchestrator
//!
//! ## Pipeline Architecture
//!
//! 1. **Fetch**: Table metadata and link records, both capped by configured limits
//! 2. **Aggregate**: One group per (table id, key value); `"undefined"` keys dropped
//! 3. **Resolve**: Representatives without coordinates are located and written back
//! 4. **Encode**: One output row per group, holding a hex EWKB point
//! 5. **Truncate**: The output table is emptied (full reload, never incremental)
//! 6. **Insert**: Rows are written in batches
//!
//! The source store is released once stage 4 completes, before the destination
//! is touched. Stages 5 and 6 run as one transaction when `atomic_replace` is set.

use crate::report::{PipelineReport, ResolutionStats};
use anyhow::{Context, Result};
use docgeom_config::{DocgeomConfig, DEFAULT_RECORD_LINK_LIMIT, DEFAULT_TABLE_META_LIMIT};
use docgeom_core::{
    aggregate, encode_point, DestinationStore, GeometryOutputRow, GeometryResolver,
    GeometrySource, LinkRecord, SourceStore, TableCatalog,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Configuration for pipeline behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum number of table metadata documents to read
    pub table_meta_limit: usize,
    /// Maximum number of link documents to read
    pub record_link_limit: usize,
    /// Rows per insert batch
    pub insert_batch_size: usize,
    /// Truncate and insert inside one destination transaction
    pub atomic_replace: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table_meta_limit: DEFAULT_TABLE_META_LIMIT,
            record_link_limit: DEFAULT_RECORD_LINK_LIMIT,
            insert_batch_size: 500,
            atomic_replace: false,
        }
    }
}

impl From<&DocgeomConfig> for PipelineConfig {
    fn from(config: &DocgeomConfig) -> Self {
        Self {
            table_meta_limit: config.source.table_meta_limit,
            record_link_limit: config.source.record_link_limit,
            insert_batch_size: config.pipeline.insert_batch_size,
            atomic_replace: config.pipeline.atomic_replace,
        }
    }
}

/// The migration orchestrator
///
/// ```text
/// DocumentGeometryPipeline
///   ├─> SourceStore       (fetch, coordinate write-back)
///   ├─> GeometrySource    (foreign table lookups)
///   └─> DestinationStore  (truncate, insert)
/// ```
///
/// Consumed by [`run`](Self::run); every store handle it holds is dropped by
/// the time `run` returns, on success or failure.
pub struct DocumentGeometryPipeline {
    source: Box<dyn SourceStore>,
    geometry: Arc<dyn GeometrySource>,
    destination: Arc<dyn DestinationStore>,
    config: PipelineConfig,
}

/// Output of the fetch-and-resolve half of a run
struct ResolvedRows {
    rows: Vec<GeometryOutputRow>,
    report: PipelineReport,
}

impl DocumentGeometryPipeline {
    /// Create a pipeline over the given stores.
    ///
    /// `geometry` and `destination` are usually the same relational store.
    pub fn new(
        source: Box<dyn SourceStore>,
        geometry: Arc<dyn GeometrySource>,
        destination: Arc<dyn DestinationStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            geometry,
            destination,
            config,
        }
    }

    /// Run every stage once.
    ///
    /// Per-group lookup and write-back problems are tallied in the report; only
    /// fetch, truncate and insert failures return an error.
    pub async fn run(self) -> Result<PipelineReport> {
        info!("Starting document geometry migration");
        match self.execute().await {
            Ok(report) => {
                info!(
                    "Completed migration in {}ms (fetch:{}, aggregate:{}, resolve:{}, write:{})",
                    report.timings.total_ms(),
                    report.timings.fetch_ms,
                    report.timings.aggregate_ms,
                    report.timings.resolve_ms,
                    report.timings.write_ms
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Migration aborted");
                Err(e)
            }
        }
    }

    async fn execute(self) -> Result<PipelineReport> {
        let Self {
            source,
            geometry,
            destination,
            config,
        } = self;

        let ResolvedRows { rows, mut report } =
            Self::fetch_and_resolve(source, geometry.as_ref(), &config).await?;
        drop(geometry);

        // Stage 5 + 6: Truncate and insert
        let write_start = Instant::now();
        report.rows_written = Self::write_rows(destination.as_ref(), &rows, &config).await?;
        report.timings.write_ms = write_start.elapsed().as_millis() as u64;

        Ok(report)
    }

    /// Stages 1 to 4; `source` is dropped on return
    async fn fetch_and_resolve(
        source: Box<dyn SourceStore>,
        geometry: &dyn GeometrySource,
        config: &PipelineConfig,
    ) -> Result<ResolvedRows> {
        let mut report = PipelineReport::default();

        // Stage 1: Fetch
        let fetch_start = Instant::now();
        let tables = source
            .fetch_table_metadata(config.table_meta_limit)
            .await
            .context("Fetch: failed to read table metadata")?;
        let mut records = source
            .fetch_link_records(config.record_link_limit)
            .await
            .context("Fetch: failed to read link records")?;
        report.tables = tables.len();
        report.records = records.len();
        report.timings.fetch_ms = fetch_start.elapsed().as_millis() as u64;
        info!(
            "Fetch: {} table metadata documents, {} link records",
            report.tables, report.records
        );

        let catalog = TableCatalog::new(tables);

        // Stage 2: Aggregate
        let aggregate_start = Instant::now();
        let aggregation = aggregate(&records);
        report.groups = aggregation.len();
        report.skipped_undefined = aggregation.skipped_undefined();
        report.timings.aggregate_ms = aggregate_start.elapsed().as_millis() as u64;
        info!(
            "Aggregate: {} groups ({} undefined keys skipped)",
            report.groups, report.skipped_undefined
        );

        // Stage 3 + 4: Resolve and encode
        let resolve_start = Instant::now();
        let resolver = GeometryResolver::new(&catalog, geometry, source.as_ref());
        let mut stats = ResolutionStats::default();
        let mut rows = Vec::with_capacity(aggregation.len());

        for group in aggregation.groups() {
            let record: &mut LinkRecord = &mut records[group.representative];
            let outcome = resolver.resolve(record).await;
            stats.record(&outcome);

            let point = encode_point(record.coordinates());
            debug!(
                table_id = group.key.table_id,
                key = %group.key.key_value,
                count = group.document_count,
                lon = record.longitude,
                lat = record.latitude,
                "Encoded group"
            );
            rows.push(GeometryOutputRow::for_record(
                record,
                &catalog,
                group.document_count,
                point,
            ));
        }

        report.resolution = stats;
        report.timings.resolve_ms = resolve_start.elapsed().as_millis() as u64;
        info!(
            "Resolve: {} looked up ({} centroid, {} first vertex, {} missing), {} write-back failures",
            stats.looked_up(),
            stats.centroid,
            stats.first_vertex,
            stats.missing(),
            stats.write_failures
        );

        Ok(ResolvedRows { rows, report })
    }

    async fn write_rows(
        destination: &dyn DestinationStore,
        rows: &[GeometryOutputRow],
        config: &PipelineConfig,
    ) -> Result<usize> {
        let batch_size = config.insert_batch_size.max(1);

        if config.atomic_replace {
            let written = destination
                .replace_all(rows, batch_size)
                .await
                .context("Insert: failed to replace output rows")?;
            info!("Replace: wrote {} rows in one transaction", written);
            return Ok(written);
        }

        destination
            .truncate()
            .await
            .context("Truncate: failed to empty output table")?;
        info!("Truncate: output table emptied");

        let mut written = 0;
        for (batch, chunk) in rows.chunks(batch_size).enumerate() {
            written += destination.insert_batch(chunk).await.with_context(|| {
                format!(
                    "Insert: failed to write batch {} ({} rows already written)",
                    batch, written
                )
            })?;
        }
        info!("Insert: wrote {} rows", written);

        Ok(written)
    }
}

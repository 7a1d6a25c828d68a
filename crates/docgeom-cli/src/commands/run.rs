//! `docgeom run`

use crate::cli::RunArgs;
use crate::factories;
use anyhow::{Context, Result};
use docgeom_config::DocgeomConfig;
use docgeom_pipeline::{DocumentGeometryPipeline, PipelineConfig, PipelineReport};
use tracing::error;

/// How a run ended once its stores were open
#[derive(Debug)]
pub enum RunOutcome {
    Completed(PipelineReport),
    /// A stage aborted; already logged
    Failed(anyhow::Error),
}

/// Apply command line overrides on top of the file configuration
pub fn pipeline_config(config: &DocgeomConfig, args: &RunArgs) -> Result<PipelineConfig> {
    let mut pipeline = PipelineConfig::from(config);
    if args.atomic_replace {
        pipeline.atomic_replace = true;
    }
    if let Some(batch_size) = args.batch_size {
        pipeline.insert_batch_size =
            usize::try_from(batch_size).context("--batch-size does not fit in memory")?;
    }
    Ok(pipeline)
}

/// Open both stores and build the pipeline.
///
/// Errors here are initialization failures.
pub async fn prepare(config: &DocgeomConfig, args: &RunArgs) -> Result<DocumentGeometryPipeline> {
    let pipeline_config = pipeline_config(config, args)?;

    println!("Connecting to source store {}", config.source.host);
    let source = factories::create_source_store(&config.source).await?;

    println!("Connecting to {}", config.destination);
    let relational = factories::create_relational_store(&config.destination).await?;

    Ok(DocumentGeometryPipeline::new(
        source,
        relational.geometry,
        relational.destination,
        pipeline_config,
    ))
}

/// Open the stores and run the migration.
///
/// `Err` only for initialization failures; a run that aborts mid-way is
/// reported as [`RunOutcome::Failed`].
pub async fn execute(config: &DocgeomConfig, args: &RunArgs) -> Result<RunOutcome> {
    let pipeline = prepare(config, args).await?;

    println!("Running document geometry migration");
    match pipeline.run().await {
        Ok(report) => {
            println!("{}", report);
            Ok(RunOutcome::Completed(report))
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Document geometry migration failed");
            println!("Migration failed: {:#}", e);
            Ok(RunOutcome::Failed(e))
        }
    }
}

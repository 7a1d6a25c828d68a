//! Pipeline Orchestration Layer
//!
//! Runs one full migration of document locations into the relational output
//! table.
//!
//! ## Architecture
//!
//! The pipeline coordinates six stages, each complete before the next starts:
//! 1. **Fetch**: Read table metadata and link records from the source store
//! 2. **Aggregate**: Group link records by (table id, key value), first seen wins
//! 3. **Resolve**: Locate unresolved representatives through the geometry source
//!    and write the result back to the source store
//! 4. **Encode**: Turn each representative into an EWKB point row
//! 5. **Truncate**: Empty the output table
//! 6. **Insert**: Write every row
//!
//! Fetch, truncate and insert failures abort the run. A group whose geometry
//! cannot be found or decoded gets the (0.1, 0.1) marker instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docgeom_pipeline::{DocumentGeometryPipeline, PipelineConfig};
//!
//! let pipeline = DocumentGeometryPipeline::new(
//!     source,
//!     relational.clone(),
//!     relational,
//!     PipelineConfig::from(&config),
//! );
//!
//! let report = pipeline.run().await?;
//! println!("{}", report);
//! ```

pub mod document_geometry_pipeline;
pub mod report;

pub use document_geometry_pipeline::*;
pub use report::{PipelineReport, ResolutionStats, StageTimings};

//! Core of the document geometry migration
//!
//! Domain records, link aggregation, geometry resolution, the EWKB codec and
//! the store traits the backends implement.

pub mod aggregate;
pub mod encoder;
pub mod ewkb;
pub mod resolver;
pub mod storage;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use aggregate::{aggregate, AggregatedGroup, Aggregation, GroupKey};
pub use encoder::encode_point;
pub use resolver::{GeometryResolver, MissReason, Resolution, ResolveOutcome};
pub use storage::{
    quote_identifier, DestinationStore, GeometrySource, SourceStore, StorageError, StorageResult,
};
pub use types::{
    Coordinates, GeometryOutputRow, LinkRecord, TableCatalog, TableMetadata,
    LOOKUP_MISS_SENTINEL, UNDEFINED_KEY, UNRESOLVED_EPSILON,
};

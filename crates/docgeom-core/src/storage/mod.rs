pub mod error;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{quote_identifier, DestinationStore, GeometrySource, SourceStore};

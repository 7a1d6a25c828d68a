//! Coordinate resolution for link records
//!
//! A record whose latitude and longitude both sit in the (-0.1, 0.1) band has
//! never been located. The resolver looks up the linked record's geometry,
//! reduces it to one point and writes that point back to the source store so
//! the next run skips it.
//!
//! Lookup misses, lookup errors and undecodable geometries all end in the
//! (0.1, 0.1) marker; none of them abort the run.

use crate::ewkb::{self, CentroidError, Geometry, GeometryError};
use crate::storage::{GeometrySource, SourceStore, StorageError};
use crate::types::{Coordinates, LinkRecord, TableCatalog};
use tracing::{debug, warn};

/// Why a lookup produced no usable point
#[derive(Debug, Clone)]
pub enum MissReason {
    NotFound,
    LookupFailed(StorageError),
    DecodeFailed(GeometryError),
    NoCoordinates,
}

/// What the resolver decided for one record
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Coordinates were already set; nothing was read or written
    AlreadyResolved,
    /// Centroid of the linked geometry
    Centroid(Coordinates),
    /// Centroid failed; first vertex of the linked geometry
    FirstVertex {
        coordinates: Coordinates,
        reason: CentroidError,
    },
    /// Sentinel written
    Missing(MissReason),
}

impl Resolution {
    /// Coordinates to store, `None` when nothing changes
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Resolution::AlreadyResolved => None,
            Resolution::Centroid(c) => Some(*c),
            Resolution::FirstVertex { coordinates, .. } => Some(*coordinates),
            Resolution::Missing(_) => Some(Coordinates::lookup_miss()),
        }
    }
}

/// Resolution plus the fate of the write-back
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub resolution: Resolution,
    /// Set when the source store rejected the update
    pub write_error: Option<StorageError>,
}

/// Reduce a geometry to its centroid, or its first vertex when that fails
pub fn representative_point(geometry: &Geometry) -> Resolution {
    match ewkb::centroid(geometry) {
        Ok(c) => Resolution::Centroid(Coordinates::new(c.x, c.y)),
        Err(reason) => match geometry.first_coord() {
            Some(c) => Resolution::FirstVertex {
                coordinates: Coordinates::new(c.x, c.y),
                reason,
            },
            None => Resolution::Missing(MissReason::NoCoordinates),
        },
    }
}

/// Decode a hex geometry and reduce it to one point
pub fn resolve_hex_geometry(hex_geometry: &str) -> Resolution {
    match ewkb::decode_hex(hex_geometry) {
        Ok(geometry) => representative_point(&geometry),
        Err(e) => Resolution::Missing(MissReason::DecodeFailed(e)),
    }
}

/// Resolves representatives against a geometry source and persists results
pub struct GeometryResolver<'a> {
    catalog: &'a TableCatalog,
    geometry: &'a dyn GeometrySource,
    source: &'a dyn SourceStore,
}

impl<'a> GeometryResolver<'a> {
    pub fn new(
        catalog: &'a TableCatalog,
        geometry: &'a dyn GeometrySource,
        source: &'a dyn SourceStore,
    ) -> Self {
        Self {
            catalog,
            geometry,
            source,
        }
    }

    /// Resolve `record` in place.
    ///
    /// Already-resolved records cost nothing. Otherwise one lookup and one
    /// write-back are issued whatever the lookup returns.
    pub async fn resolve(&self, record: &mut LinkRecord) -> ResolveOutcome {
        if !record.is_unresolved() {
            return ResolveOutcome {
                resolution: Resolution::AlreadyResolved,
                write_error: None,
            };
        }

        let table = self.catalog.table_name(record.table_id);
        let field = self.catalog.key_field(record.table_id);

        let resolution = match self
            .geometry
            .select_geometry(table, field, &record.key_value)
            .await
        {
            Ok(Some(hex_geometry)) => resolve_hex_geometry(&hex_geometry),
            Ok(None) => Resolution::Missing(MissReason::NotFound),
            Err(e) => Resolution::Missing(MissReason::LookupFailed(e)),
        };

        match &resolution {
            Resolution::Missing(reason) => warn!(
                table,
                field,
                key = %record.key_value,
                ?reason,
                "No geometry for record, marking as looked up"
            ),
            Resolution::FirstVertex { reason, .. } => debug!(
                key = %record.key_value,
                %reason,
                "Centroid failed, using first vertex"
            ),
            _ => {}
        }

        let mut write_error = None;
        if let Some(coordinates) = resolution.coordinates() {
            record.set_coordinates(coordinates);
            if let Err(e) = self.source.update_coordinates(&record.id, coordinates).await {
                warn!(id = %record.id, error = %e, "Failed to persist resolved coordinates");
                write_error = Some(e);
            }
        }

        ResolveOutcome {
            resolution,
            write_error,
        }
    }
}

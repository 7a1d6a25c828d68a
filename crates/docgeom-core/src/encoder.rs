//! Output point encoding

use crate::ewkb::{self, ByteOrder, Coord, Geometry, Layout, Shape, SRID_WGS84};
use crate::types::Coordinates;

/// Encode `(lon, lat)` as a hex EWKB `POINT Z (lon lat 0)` in SRID 4326, little endian.
///
/// No range checks: whatever the record holds is written.
pub fn encode_point(coordinates: Coordinates) -> String {
    let point = Geometry::new(
        Layout::XYZ,
        Shape::Point(Some(Coord::xyz(coordinates.lon, coordinates.lat, 0.0))),
    )
    .with_srid(SRID_WGS84);
    ewkb::encode_hex(&point, ByteOrder::Ndr)
}

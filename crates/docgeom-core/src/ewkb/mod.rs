//! Extended Well-Known Binary geometry codec
//!
//! Reads OGC WKB, ISO WKB (Z/M type offsets) and PostGIS EWKB (flag bits plus
//! an optional SRID) in either byte order, and writes EWKB.
//!
//! ```text
//! [byte order: u8][type: u32][srid: u32, if flagged][body...]
//! ```

pub mod centroid;
mod decode;
mod encode;

pub use centroid::{centroid, CentroidError};
pub use decode::{decode, decode_hex};
pub use encode::{encode, encode_hex};

use thiserror::Error;

/// WGS84 geographic coordinates
pub const SRID_WGS84: u32 = 4326;

pub(crate) const EWKB_Z_FLAG: u32 = 0x8000_0000;
pub(crate) const EWKB_M_FLAG: u32 = 0x4000_0000;
pub(crate) const EWKB_SRID_FLAG: u32 = 0x2000_0000;
pub(crate) const EWKB_TYPE_MASK: u32 = 0x0FFF_FFFF;

/// Byte order marker of a WKB header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Big endian, marker 0
    Xdr,
    /// Little endian, marker 1
    Ndr,
}

impl ByteOrder {
    pub(crate) fn marker(self) -> u8 {
        match self {
            ByteOrder::Xdr => 0,
            ByteOrder::Ndr => 1,
        }
    }
}

/// Which ordinates each coordinate carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    XY,
    XYZ,
    XYM,
    XYZM,
}

impl Layout {
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Layout::XY,
            (true, false) => Layout::XYZ,
            (false, true) => Layout::XYM,
            (true, true) => Layout::XYZM,
        }
    }

    pub fn has_z(self) -> bool {
        matches!(self, Layout::XYZ | Layout::XYZM)
    }

    pub fn has_m(self) -> bool {
        matches!(self, Layout::XYM | Layout::XYZM)
    }

    /// Ordinates per coordinate
    pub fn stride(self) -> usize {
        2 + self.has_z() as usize + self.has_m() as usize
    }
}

/// A single position. `z` and `m` are zero when the layout lacks them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0, m: 0.0 }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, m: 0.0 }
    }
}

/// Geometry body, one variant per WKB type
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `None` is the empty point
    Point(Option<Coord>),
    LineString(Vec<Coord>),
    /// Shell first, then holes
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Shape>),
}

impl Shape {
    /// WKB type code without dimension flags
    pub fn type_code(&self) -> u32 {
        match self {
            Shape::Point(_) => 1,
            Shape::LineString(_) => 2,
            Shape::Polygon(_) => 3,
            Shape::MultiPoint(_) => 4,
            Shape::MultiLineString(_) => 5,
            Shape::MultiPolygon(_) => 6,
            Shape::GeometryCollection(_) => 7,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Point(_) => "Point",
            Shape::LineString(_) => "LineString",
            Shape::Polygon(_) => "Polygon",
            Shape::MultiPoint(_) => "MultiPoint",
            Shape::MultiLineString(_) => "MultiLineString",
            Shape::MultiPolygon(_) => "MultiPolygon",
            Shape::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// All coordinates in storage order
    pub fn flat_coords(&self) -> Vec<Coord> {
        let mut out = Vec::new();
        self.collect_coords(&mut out);
        out
    }

    fn collect_coords(&self, out: &mut Vec<Coord>) {
        match self {
            Shape::Point(p) => out.extend(p.iter().copied()),
            Shape::LineString(line) | Shape::MultiPoint(line) => out.extend_from_slice(line),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().for_each(|r| out.extend_from_slice(r))
            }
            Shape::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .for_each(|r| out.extend_from_slice(r)),
            Shape::GeometryCollection(members) => {
                members.iter().for_each(|m| m.collect_coords(out))
            }
        }
    }
}

/// A decoded geometry with its layout and spatial reference
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub srid: Option<u32>,
    pub layout: Layout,
    pub shape: Shape,
}

impl Geometry {
    pub fn new(layout: Layout, shape: Shape) -> Self {
        Self {
            srid: None,
            layout,
            shape,
        }
    }

    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    /// First coordinate of the flattened coordinate list
    pub fn first_coord(&self) -> Option<Coord> {
        self.shape.flat_coords().into_iter().next()
    }
}

/// Errors raised while decoding WKB
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("Invalid byte order marker {0}")]
    InvalidByteOrder(u8),

    #[error("Unknown geometry type {0}")]
    UnknownGeometryType(u32),

    #[error("Expected {expected} member, found {found}")]
    UnexpectedMember {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Element count {count} exceeds remaining input")]
    CountTooLarge { count: u32 },

    #[error("Collections nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0} trailing bytes after geometry")]
    TrailingBytes(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stride() {
        assert_eq!(Layout::XY.stride(), 2);
        assert_eq!(Layout::XYZ.stride(), 3);
        assert_eq!(Layout::XYM.stride(), 3);
        assert_eq!(Layout::XYZM.stride(), 4);
    }

    #[test]
    fn test_first_coord_follows_storage_order() {
        let geometry = Geometry::new(
            Layout::XY,
            Shape::GeometryCollection(vec![
                Shape::Point(None),
                Shape::LineString(vec![Coord::xy(3.0, 4.0), Coord::xy(5.0, 6.0)]),
            ]),
        );
        assert_eq!(geometry.first_coord(), Some(Coord::xy(3.0, 4.0)));
    }
}

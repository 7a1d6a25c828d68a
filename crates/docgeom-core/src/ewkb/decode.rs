//! WKB / EWKB reader

use super::{
    ByteOrder, Coord, Geometry, GeometryError, Layout, Shape, EWKB_M_FLAG, EWKB_SRID_FLAG,
    EWKB_TYPE_MASK, EWKB_Z_FLAG,
};

const MAX_DEPTH: usize = 32;

/// Decode a hex string (either case) holding WKB or EWKB
pub fn decode_hex(hex_str: &str) -> Result<Geometry, GeometryError> {
    let bytes = hex::decode(hex_str.trim()).map_err(|e| GeometryError::InvalidHex(e.to_string()))?;
    decode(&bytes)
}

/// Decode WKB or EWKB bytes. The whole input must be consumed.
pub fn decode(bytes: &[u8]) -> Result<Geometry, GeometryError> {
    let mut reader = Reader { buf: bytes, pos: 0 };
    let header = reader.header()?;
    let shape = reader.body(&header, 0)?;

    let remaining = reader.remaining();
    if remaining != 0 {
        return Err(GeometryError::TrailingBytes(remaining));
    }

    Ok(Geometry {
        srid: header.srid,
        layout: header.layout,
        shape,
    })
}

struct Header {
    order: ByteOrder,
    kind: u32,
    layout: Layout,
    srid: Option<u32>,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], GeometryError> {
        let end = self.pos + N;
        let slice = self
            .buf
            .get(self.pos..end)
            .ok_or(GeometryError::UnexpectedEof { offset: self.pos })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, GeometryError> {
        Ok(self.take::<1>()?[0])
    }

    fn u32(&mut self, order: ByteOrder) -> Result<u32, GeometryError> {
        let raw = self.take::<4>()?;
        Ok(match order {
            ByteOrder::Ndr => u32::from_le_bytes(raw),
            ByteOrder::Xdr => u32::from_be_bytes(raw),
        })
    }

    fn f64(&mut self, order: ByteOrder) -> Result<f64, GeometryError> {
        let raw = self.take::<8>()?;
        Ok(match order {
            ByteOrder::Ndr => f64::from_le_bytes(raw),
            ByteOrder::Xdr => f64::from_be_bytes(raw),
        })
    }

    fn header(&mut self) -> Result<Header, GeometryError> {
        let order = match self.u8()? {
            0 => ByteOrder::Xdr,
            1 => ByteOrder::Ndr,
            other => return Err(GeometryError::InvalidByteOrder(other)),
        };
        let raw = self.u32(order)?;

        // EWKB flags and ISO offsets (1000 = Z, 2000 = M, 3000 = ZM) may both appear
        let base = raw & EWKB_TYPE_MASK;
        let (iso_z, iso_m) = match base / 1000 {
            0 => (false, false),
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => return Err(GeometryError::UnknownGeometryType(raw)),
        };
        let kind = base % 1000;
        if !(1..=7).contains(&kind) {
            return Err(GeometryError::UnknownGeometryType(raw));
        }

        let layout = Layout::from_flags(
            raw & EWKB_Z_FLAG != 0 || iso_z,
            raw & EWKB_M_FLAG != 0 || iso_m,
        );
        let srid = if raw & EWKB_SRID_FLAG != 0 {
            Some(self.u32(order)?)
        } else {
            None
        };

        Ok(Header {
            order,
            kind,
            layout,
            srid,
        })
    }

    /// Read a count and make sure the input can hold that many items
    fn count(&mut self, order: ByteOrder, min_item_size: usize) -> Result<usize, GeometryError> {
        let count = self.u32(order)?;
        if (count as usize).saturating_mul(min_item_size) > self.remaining() {
            return Err(GeometryError::CountTooLarge { count });
        }
        Ok(count as usize)
    }

    fn coord(&mut self, order: ByteOrder, layout: Layout) -> Result<Coord, GeometryError> {
        let x = self.f64(order)?;
        let y = self.f64(order)?;
        let z = if layout.has_z() { self.f64(order)? } else { 0.0 };
        let m = if layout.has_m() { self.f64(order)? } else { 0.0 };
        Ok(Coord { x, y, z, m })
    }

    fn coords(&mut self, order: ByteOrder, layout: Layout) -> Result<Vec<Coord>, GeometryError> {
        let n = self.count(order, layout.stride() * 8)?;
        (0..n).map(|_| self.coord(order, layout)).collect()
    }

    fn rings(
        &mut self,
        order: ByteOrder,
        layout: Layout,
    ) -> Result<Vec<Vec<Coord>>, GeometryError> {
        let n = self.count(order, 4)?;
        (0..n).map(|_| self.coords(order, layout)).collect()
    }

    /// Read a nested member and require it to be of `expected_kind`
    fn member(&mut self, expected_kind: u32, depth: usize) -> Result<Shape, GeometryError> {
        let header = self.header()?;
        let shape = self.body(&header, depth + 1)?;
        if header.kind != expected_kind {
            return Err(GeometryError::UnexpectedMember {
                expected: kind_name(expected_kind),
                found: shape.kind_name(),
            });
        }
        Ok(shape)
    }

    fn body(&mut self, header: &Header, depth: usize) -> Result<Shape, GeometryError> {
        if depth > MAX_DEPTH {
            return Err(GeometryError::TooDeep(MAX_DEPTH));
        }
        let (order, layout) = (header.order, header.layout);

        Ok(match header.kind {
            1 => {
                let c = self.coord(order, layout)?;
                // Empty points are written with NaN ordinates
                if c.x.is_nan() && c.y.is_nan() {
                    Shape::Point(None)
                } else {
                    Shape::Point(Some(c))
                }
            }
            2 => Shape::LineString(self.coords(order, layout)?),
            3 => Shape::Polygon(self.rings(order, layout)?),
            4 => {
                let n = self.count(order, 5)?;
                let mut points = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Shape::Point(Some(c)) = self.member(1, depth)? {
                        points.push(c);
                    }
                }
                Shape::MultiPoint(points)
            }
            5 => {
                let n = self.count(order, 9)?;
                let mut lines = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Shape::LineString(line) = self.member(2, depth)? {
                        lines.push(line);
                    }
                }
                Shape::MultiLineString(lines)
            }
            6 => {
                let n = self.count(order, 9)?;
                let mut polygons = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Shape::Polygon(rings) = self.member(3, depth)? {
                        polygons.push(rings);
                    }
                }
                Shape::MultiPolygon(polygons)
            }
            7 => {
                let n = self.count(order, 5)?;
                let mut members = Vec::with_capacity(n);
                for _ in 0..n {
                    let member_header = self.header()?;
                    members.push(self.body(&member_header, depth + 1)?);
                }
                Shape::GeometryCollection(members)
            }
            other => return Err(GeometryError::UnknownGeometryType(other)),
        })
    }
}

fn kind_name(kind: u32) -> &'static str {
    match kind {
        1 => "Point",
        2 => "LineString",
        3 => "Polygon",
        4 => "MultiPoint",
        5 => "MultiLineString",
        6 => "MultiPolygon",
        _ => "GeometryCollection",
    }
}

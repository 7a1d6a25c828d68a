//! EWKB writer

use super::{ByteOrder, Coord, Geometry, Layout, Shape, EWKB_M_FLAG, EWKB_SRID_FLAG, EWKB_Z_FLAG};

/// Encode as EWKB and render lowercase hex
pub fn encode_hex(geometry: &Geometry, order: ByteOrder) -> String {
    hex::encode(encode(geometry, order))
}

/// Encode as EWKB. The SRID is written on the outer header only.
pub fn encode(geometry: &Geometry, order: ByteOrder) -> Vec<u8> {
    let mut writer = Writer {
        buf: Vec::with_capacity(64),
        order,
        layout: geometry.layout,
    };
    writer.geometry(&geometry.shape, geometry.srid);
    writer.buf
}

struct Writer {
    buf: Vec<u8>,
    order: ByteOrder,
    layout: Layout,
}

impl Writer {
    fn u32(&mut self, v: u32) {
        match self.order {
            ByteOrder::Ndr => self.buf.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::Xdr => self.buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn f64(&mut self, v: f64) {
        match self.order {
            ByteOrder::Ndr => self.buf.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::Xdr => self.buf.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn header(&mut self, shape: &Shape, srid: Option<u32>) {
        self.buf.push(self.order.marker());
        let mut kind = shape.type_code();
        if self.layout.has_z() {
            kind |= EWKB_Z_FLAG;
        }
        if self.layout.has_m() {
            kind |= EWKB_M_FLAG;
        }
        if srid.is_some() {
            kind |= EWKB_SRID_FLAG;
        }
        self.u32(kind);
        if let Some(srid) = srid {
            self.u32(srid);
        }
    }

    fn coord(&mut self, c: &Coord) {
        self.f64(c.x);
        self.f64(c.y);
        if self.layout.has_z() {
            self.f64(c.z);
        }
        if self.layout.has_m() {
            self.f64(c.m);
        }
    }

    fn coords(&mut self, coords: &[Coord]) {
        self.u32(coords.len() as u32);
        coords.iter().for_each(|c| self.coord(c));
    }

    fn rings(&mut self, rings: &[Vec<Coord>]) {
        self.u32(rings.len() as u32);
        rings.iter().for_each(|r| self.coords(r));
    }

    fn geometry(&mut self, shape: &Shape, srid: Option<u32>) {
        self.header(shape, srid);
        match shape {
            Shape::Point(Some(c)) => self.coord(c),
            Shape::Point(None) => {
                for _ in 0..self.layout.stride() {
                    self.f64(f64::NAN);
                }
            }
            Shape::LineString(coords) => self.coords(coords),
            Shape::Polygon(rings) => self.rings(rings),
            Shape::MultiPoint(points) => {
                self.u32(points.len() as u32);
                for p in points {
                    self.geometry(&Shape::Point(Some(*p)), None);
                }
            }
            Shape::MultiLineString(lines) => {
                self.u32(lines.len() as u32);
                for line in lines {
                    self.header(&Shape::LineString(Vec::new()), None);
                    self.coords(line);
                }
            }
            Shape::MultiPolygon(polygons) => {
                self.u32(polygons.len() as u32);
                for rings in polygons {
                    self.header(&Shape::Polygon(Vec::new()), None);
                    self.rings(rings);
                }
            }
            Shape::GeometryCollection(members) => {
                self.u32(members.len() as u32);
                for member in members {
                    self.geometry(member, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ewkb::{decode, decode_hex, SRID_WGS84};

    #[test]
    fn test_point_matches_postgis_bytes() {
        let geometry = Geometry::new(Layout::XY, Shape::Point(Some(Coord::xy(1.0, 2.0))))
            .with_srid(SRID_WGS84);
        assert_eq!(
            encode_hex(&geometry, ByteOrder::Ndr),
            "0101000020e6100000000000000000f03f0000000000000040"
        );
    }

    #[test]
    fn test_nested_collection_survives_both_byte_orders() {
        let square = vec![
            Coord::xy(0.0, 0.0),
            Coord::xy(2.0, 0.0),
            Coord::xy(2.0, 2.0),
            Coord::xy(0.0, 2.0),
            Coord::xy(0.0, 0.0),
        ];
        let geometry = Geometry::new(
            Layout::XYZM,
            Shape::GeometryCollection(vec![
                Shape::MultiPolygon(vec![vec![square.clone()]]),
                Shape::MultiLineString(vec![square.clone()]),
                Shape::MultiPoint(vec![Coord {
                    x: 1.0,
                    y: 2.0,
                    z: 3.0,
                    m: 4.0,
                }]),
                Shape::Point(None),
            ]),
        )
        .with_srid(3857);

        for order in [ByteOrder::Ndr, ByteOrder::Xdr] {
            let bytes = encode(&geometry, order);
            assert_eq!(bytes[0], order.marker());
            assert_eq!(decode(&bytes).unwrap(), geometry);
        }
    }

    #[test]
    fn test_hex_is_lowercase_and_decodable() {
        let geometry = Geometry::new(
            Layout::XY,
            Shape::LineString(vec![Coord::xy(-1.5, 3.25), Coord::xy(7.0, -8.0)]),
        );
        let hex_str = encode_hex(&geometry, ByteOrder::Ndr);
        assert_eq!(hex_str, hex_str.to_lowercase());
        assert_eq!(decode_hex(&hex_str.to_uppercase()).unwrap(), geometry);
    }
}

//! Planar centroids
//!
//! Points average their positions, lines weight segment midpoints by length,
//! polygons weight ring centroids by area with holes subtracted. Collections
//! are not supported. Zero-length and zero-area input is reported as degenerate
//! so callers can fall back to a vertex.

use super::{Coord, Geometry, Shape};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CentroidError {
    #[error("geometry has no coordinates")]
    Empty,

    #[error("{0} is not a supported type for centroid calculation")]
    Unsupported(&'static str),

    #[error("degenerate geometry: zero {0}")]
    Degenerate(&'static str),
}

/// Centroid as an XY coordinate
pub fn centroid(geometry: &Geometry) -> Result<Coord, CentroidError> {
    let c = match &geometry.shape {
        Shape::Point(Some(c)) => Coord::xy(c.x, c.y),
        Shape::Point(None) => return Err(CentroidError::Empty),
        Shape::MultiPoint(points) => points_centroid(points)?,
        Shape::LineString(line) => lines_centroid(std::iter::once(line.as_slice()))?,
        Shape::MultiLineString(lines) => lines_centroid(lines.iter().map(Vec::as_slice))?,
        Shape::Polygon(rings) => polygons_centroid(std::slice::from_ref(rings))?,
        Shape::MultiPolygon(polygons) => polygons_centroid(polygons)?,
        other => return Err(CentroidError::Unsupported(other.kind_name())),
    };

    if c.x.is_finite() && c.y.is_finite() {
        Ok(c)
    } else {
        Err(CentroidError::Degenerate("extent"))
    }
}

fn points_centroid(points: &[Coord]) -> Result<Coord, CentroidError> {
    if points.is_empty() {
        return Err(CentroidError::Empty);
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Ok(Coord::xy(sx / n, sy / n))
}

fn lines_centroid<'a>(
    lines: impl Iterator<Item = &'a [Coord]>,
) -> Result<Coord, CentroidError> {
    let mut any = false;
    let (mut total, mut sx, mut sy) = (0.0, 0.0, 0.0);

    for line in lines {
        any |= !line.is_empty();
        for seg in line.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let len = (b.x - a.x).hypot(b.y - a.y);
            total += len;
            sx += len * (a.x + b.x) / 2.0;
            sy += len * (a.y + b.y) / 2.0;
        }
    }

    if !any {
        return Err(CentroidError::Empty);
    }
    if total == 0.0 {
        return Err(CentroidError::Degenerate("length"));
    }
    Ok(Coord::xy(sx / total, sy / total))
}

fn polygons_centroid(polygons: &[Vec<Vec<Coord>>]) -> Result<Coord, CentroidError> {
    // Work relative to the first vertex to keep the cross products small
    let base = polygons
        .iter()
        .flatten()
        .flatten()
        .next()
        .copied()
        .ok_or(CentroidError::Empty)?;

    let (mut area, mut sx, mut sy) = (0.0, 0.0, 0.0);
    for rings in polygons {
        for (i, ring) in rings.iter().enumerate() {
            let (a2, cx, cy) = ring_moments(ring, base);
            if a2 == 0.0 {
                continue;
            }
            // Shells add, holes subtract, whatever the winding
            let weight = if i == 0 { 1.0 } else { -1.0 };
            area += weight * a2.abs() / 2.0;
            sx += weight * a2.signum() * cx / 6.0;
            sy += weight * a2.signum() * cy / 6.0;
        }
    }

    if area == 0.0 {
        return Err(CentroidError::Degenerate("area"));
    }
    Ok(Coord::xy(base.x + sx / area, base.y + sy / area))
}

/// Twice the signed area and the first moments of a ring, relative to `base`
fn ring_moments(ring: &[Coord], base: Coord) -> (f64, f64, f64) {
    let n = ring.len();
    let (mut a2, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        let (x0, y0) = (p.x - base.x, p.y - base.y);
        let (x1, y1) = (q.x - base.x, q.y - base.y);
        let cross = x0 * y1 - x1 * y0;
        a2 += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    (a2, cx, cy)
}

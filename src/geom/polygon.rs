use anyhow::{bail, Result};
use geo::{Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile as shp;

/// Ensure first and last are the same for geo::LineString coords
fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
    if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
        coords.push(coords[0])
    }
}

/// Get the signed area of a coordinate ring (negative for clockwise)
fn signed_area(pts: &[Coord<f64>]) -> f64 {
    let mut a = 0.0;
    for w in pts.windows(2) {
        a += w[0].x * w[1].y - w[1].x * w[0].y;
    }
    a / 2.0
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> MultiPolygon<f64> {
    // 1) Convert each ring into a LineString (ensure closed)
    let mut ls_rings: Vec<(LineString<f64>, bool /*is_exterior*/)> = Vec::with_capacity(p.rings().len());
    for ring in p.rings().iter() {
        let mut coords: Vec<Coord<f64>> = ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
        ensure_closed(&mut coords);
        // Shapefile exteriors are clockwise.
        let is_exterior = signed_area(&coords) < 0.0;
        ls_rings.push((LineString(coords), is_exterior));
    }

    // 2) Group: each exterior with its following holes (Shapefile stores rings in this order)
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for (ls, is_exterior) in ls_rings {
        if is_exterior {
            if let Some(ext) = current_exterior.take() {
                polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
            }
            current_exterior = Some(ls);
        } else {
            current_holes.push(ls);
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon
pub(crate) fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    fn ring_points(ls: &LineString<f64>) -> (Vec<shp::Point>, f64) {
        let mut coords = ls.0.clone();
        ensure_closed(&mut coords);
        let area = signed_area(&coords);
        (coords.iter().map(|c| shp::Point { x: c.x, y: c.y }).collect(), area)
    }

    // Build a flat list of rings in Shapefile ordering:
    // [ext CW, hole CCW, hole CCW, ..., next ext CW, ...]
    let mut rings: Vec<shp::PolygonRing<shp::Point>> = Vec::new();

    for poly in &mp.0 {
        let (mut ext_pts, area) = ring_points(poly.exterior());
        if area > 0.0 {
            ext_pts.reverse(); // make CW
        }
        rings.push(shp::PolygonRing::Outer(ext_pts));

        for hole in poly.interiors() {
            let (mut hole_pts, area) = ring_points(hole);
            if area < 0.0 {
                hole_pts.reverse(); // make CCW
            }
            rings.push(shp::PolygonRing::Inner(hole_pts));
        }
    }

    shp::Polygon::with_rings(rings)
}

/// Drop the M/Z dimensions of a polygon ring.
fn flatten_ring<P>(ring: &shp::PolygonRing<P>, xy: impl Fn(&P) -> shp::Point) -> shp::PolygonRing<shp::Point> {
    match ring {
        shp::PolygonRing::Outer(pts) => shp::PolygonRing::Outer(pts.iter().map(&xy).collect()),
        shp::PolygonRing::Inner(pts) => shp::PolygonRing::Inner(pts.iter().map(&xy).collect()),
    }
}

fn parts_to_geo(parts: Vec<Vec<Coord<f64>>>) -> Geometry<f64> {
    let mut lines: Vec<LineString<f64>> = parts.into_iter().map(LineString).collect();
    if lines.len() == 1 {
        Geometry::LineString(lines.remove(0))
    } else {
        Geometry::MultiLineString(MultiLineString(lines))
    }
}

fn polygon_to_geo(p: &shp::Polygon) -> Geometry<f64> {
    let mut mp = shp_to_geo(p);
    if mp.0.len() == 1 {
        Geometry::Polygon(mp.0.remove(0))
    } else {
        Geometry::MultiPolygon(mp)
    }
}

/// Convert any shapefile record shape into a 2D geo geometry.
/// Null shapes become an empty geometry collection; M/Z values are dropped.
pub(crate) fn shape_to_geometry(shape: shp::Shape) -> Result<Geometry<f64>> {
    use shp::Shape;

    let xy = |x: f64, y: f64| Coord { x, y };
    let geometry = match shape {
        Shape::NullShape => Geometry::GeometryCollection(GeometryCollection::default()),
        Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::Multipoint(mp) => Geometry::MultiPoint(MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect())),
        Shape::MultipointM(mp) => Geometry::MultiPoint(MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect())),
        Shape::MultipointZ(mp) => Geometry::MultiPoint(MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect())),
        Shape::Polyline(pl) => parts_to_geo(pl.parts().iter().map(|part| part.iter().map(|p| xy(p.x, p.y)).collect()).collect()),
        Shape::PolylineM(pl) => parts_to_geo(pl.parts().iter().map(|part| part.iter().map(|p| xy(p.x, p.y)).collect()).collect()),
        Shape::PolylineZ(pl) => parts_to_geo(pl.parts().iter().map(|part| part.iter().map(|p| xy(p.x, p.y)).collect()).collect()),
        Shape::Polygon(p) => polygon_to_geo(&p),
        Shape::PolygonM(p) => polygon_to_geo(&shp::Polygon::with_rings(
            p.rings().iter().map(|r| flatten_ring(r, |pt| shp::Point { x: pt.x, y: pt.y })).collect(),
        )),
        Shape::PolygonZ(p) => polygon_to_geo(&shp::Polygon::with_rings(
            p.rings().iter().map(|r| flatten_ring(r, |pt| shp::Point { x: pt.x, y: pt.y })).collect(),
        )),
        Shape::Multipatch(_) => bail!("[shape_to_geometry] Multipatch shapes are not supported"),
    };
    Ok(geometry)
}

/// Kind of shape a Shapefile can hold; one per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShapeKind { Point, Multipoint, Polyline, Polygon }

impl ShapeKind {
    /// The Shapefile shape kind for a geometry, or None for an empty collection (null shape).
    pub(crate) fn of(geometry: &Geometry<f64>) -> Result<Option<Self>> {
        let kind = match geometry {
            Geometry::Point(_) => ShapeKind::Point,
            Geometry::MultiPoint(_) => ShapeKind::Multipoint,
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => ShapeKind::Polyline,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => ShapeKind::Polygon,
            Geometry::GeometryCollection(gc) if gc.0.is_empty() => return Ok(None),
            Geometry::GeometryCollection(_) => bail!("[ShapeKind::of] Geometry collections cannot be stored in a Shapefile"),
        };
        Ok(Some(kind))
    }
}

pub(crate) fn geo_to_shp_point(p: &Point<f64>) -> shp::Point {
    shp::Point { x: p.x(), y: p.y() }
}

pub(crate) fn geo_to_shp_multipoint(mp: &MultiPoint<f64>) -> shp::Multipoint {
    shp::Multipoint::new(mp.0.iter().map(geo_to_shp_point).collect())
}

pub(crate) fn geo_to_shp_polyline(lines: &[LineString<f64>]) -> shp::Polyline {
    shp::Polyline::with_parts(
        lines.iter()
            .map(|ls| ls.coords().map(|c| shp::Point { x: c.x, y: c.y }).collect())
            .collect(),
    )
}

/// Polygonal geometry as a MultiPolygon, or None if the geometry is not polygonal.
pub(crate) fn as_multipolygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon(vec![t.to_polygon()])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area, Geometry, MultiPolygon};
    use shapefile as shp;

    use super::*;

    #[test]
    fn polygon_with_hole_survives_shapefile_rings() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 1.0)]],
        );
        let mp = MultiPolygon(vec![poly]);

        let back = shp_to_geo(&geo_to_shp(&mp));
        assert_eq!(back.0.len(), 1);
        assert_eq!(back.0[0].interiors().len(), 1);
        assert!((back.unsigned_area() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn single_polygon_shape_becomes_polygon() {
        let mp = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        let geometry = shape_to_geometry(shp::Shape::Polygon(geo_to_shp(&mp))).unwrap();
        assert!(matches!(geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn null_shape_is_empty_collection() {
        let geometry = shape_to_geometry(shp::Shape::NullShape).unwrap();
        assert!(matches!(&geometry, Geometry::GeometryCollection(gc) if gc.0.is_empty()));
        assert_eq!(ShapeKind::of(&geometry).unwrap(), None);
    }

    #[test]
    fn shape_kinds() {
        let point = Geometry::Point(geo::Point::new(1.0, 2.0));
        assert_eq!(ShapeKind::of(&point).unwrap(), Some(ShapeKind::Point));
        let line = Geometry::LineString(geo::LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert_eq!(ShapeKind::of(&line).unwrap(), Some(ShapeKind::Polyline));
        assert!(as_multipolygon(&line).is_none());
    }
}

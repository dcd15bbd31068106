use anyhow::{anyhow, Context, Result};
use geo::{Coord, Geometry, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::crs::Crs;

/// A source -> target CRS pair, built once and applied to many geometries.
pub(crate) struct Reprojection {
    from: (Crs, Proj4),
    to: (Crs, Proj4),
}

impl Reprojection {
    pub(crate) fn new(from: Crs, to: Crs) -> Result<Self> {
        let build = |crs: Crs| -> Result<Proj4> {
            let proj_string = crs.proj4()?;
            Proj4::from_proj_string(&proj_string)
                .with_context(|| anyhow!("failed to build PROJ.4 for {crs}: {proj_string}"))
        };
        Ok(Self { from: (from, build(from)?), to: (to, build(to)?) })
    }

    /// Transform a single coordinate. Geographic CRSs take and give degrees.
    pub(crate) fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (from_crs, from) = &self.from;
        let (to_crs, to) = &self.to;

        let mut point = if from_crs.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(from, to, &mut point)
            .map_err(|e| anyhow!("CRS transform {from_crs} -> {to_crs} failed at ({}, {}): {e:?}", coord.x, coord.y))?;

        Ok(if to_crs.is_geographic() {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }

    pub(crate) fn geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        geometry.try_map_coords(|coord| self.coord(coord))
    }
}

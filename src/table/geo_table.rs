use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::Geometry;
use polars::frame::DataFrame;

use crate::{crs::Crs, geom::Reprojection, io::{self, GeoFormat}};
use super::value::{cell, AttrValue};

/// An attribute table with one geometry per row, as stored in a container file layer.
#[derive(Debug, Clone)]
pub struct GeoTable {
    crs: Option<Crs>,
    data: DataFrame,
    geoms: Vec<Geometry<f64>>,
}

impl GeoTable {
    /// Build a table; `data` must have one row per geometry unless it has no columns at all.
    pub fn new(data: DataFrame, geoms: Vec<Geometry<f64>>, crs: Option<Crs>) -> Result<Self> {
        if data.width() > 0 && data.height() != geoms.len() {
            bail!(
                "[GeoTable::new] Attribute rows ({}) do not match geometry count ({})",
                data.height(),
                geoms.len()
            );
        }
        Ok(Self { crs, data, geoms })
    }

    /// Read a container file, choosing the format from its extension.
    pub fn read(path: &Path) -> Result<Self> {
        io::read_table(path)
    }

    /// Write to `path`, choosing the format from its extension. Overwrites existing files.
    pub fn write(&self, path: &Path) -> Result<()> {
        self.write_to(path, GeoFormat::from_path(path)?)
    }

    /// Write to `path` in an explicit format. Overwrites existing files.
    pub fn write_to(&self, path: &Path, format: GeoFormat) -> Result<()> {
        io::write_table(self, path, format)
    }

    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.geoms.is_empty() }

    #[inline] pub fn crs(&self) -> Option<Crs> { self.crs }

    /// Tag the table with a CRS without touching coordinates.
    pub fn set_crs(&mut self, crs: Crs) { self.crs = Some(crs) }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn geoms(&self) -> &[Geometry<f64>] { &self.geoms }

    pub fn column_names(&self) -> Vec<String> {
        self.data.get_columns().iter().map(|c| c.name().to_string()).collect()
    }

    /// Case-insensitive column lookup, returning the name as stored.
    pub fn find_column(&self, name: &str) -> Option<String> {
        self.data.get_columns().iter()
            .map(|c| c.name().as_str())
            .find(|n| n.eq_ignore_ascii_case(name))
            .map(str::to_string)
    }

    pub(crate) fn value(&self, column: &str, row: usize) -> Result<AttrValue> {
        cell(&self.data, column, row)
    }

    /// A copy of the table with every geometry reprojected to `target`.
    pub fn to_crs(&self, target: Crs) -> Result<Self> {
        let source = self.crs
            .ok_or_else(|| anyhow!("[GeoTable::to_crs] Table has no CRS to convert from"))?;
        if source == target {
            return Ok(self.clone());
        }

        let reprojection = Reprojection::new(source, target)?;
        let geoms = self.geoms.iter().enumerate()
            .map(|(row, g)| reprojection.geometry(g).with_context(|| format!("Failed to reproject row {row}")))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("[GeoTable::to_crs] reprojected {} rows {source} -> {target}", geoms.len());
        Ok(Self { crs: Some(target), data: self.data.clone(), geoms })
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};
    use polars::prelude::{Column, DataFrame};

    use super::GeoTable;
    use crate::crs::Crs;

    fn points(n: usize) -> Vec<Geometry<f64>> {
        (0..n).map(|i| Geometry::Point(Point::new(i as f64, 0.0))).collect()
    }

    #[test]
    fn row_count_must_match() {
        let df = DataFrame::new(vec![Column::new("id".into(), vec![1i64, 2])]).unwrap();
        assert!(GeoTable::new(df.clone(), points(3), None).is_err());
        assert_eq!(GeoTable::new(df, points(2), None).unwrap().len(), 2);
    }

    #[test]
    fn geometry_only_table() {
        let table = GeoTable::new(DataFrame::empty(), points(4), Some(Crs::WGS84)).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.column_names().is_empty());
    }

    #[test]
    fn find_column_ignores_case() {
        let df = DataFrame::new(vec![Column::new("CENTER_LON".into(), vec![1.0f64])]).unwrap();
        let table = GeoTable::new(df, points(1), None).unwrap();
        assert_eq!(table.find_column("center_lon").as_deref(), Some("CENTER_LON"));
        assert_eq!(table.find_column("center_lat"), None);
    }

    #[test]
    fn to_crs_needs_a_source() {
        let table = GeoTable::new(DataFrame::empty(), points(1), None).unwrap();
        assert!(table.to_crs(Crs::BRITISH_NATIONAL_GRID).is_err());

        let tagged = GeoTable::new(DataFrame::empty(), points(1), Some(Crs::WGS84)).unwrap();
        let same = tagged.to_crs(Crs::WGS84).unwrap();
        assert_eq!(same.geoms(), tagged.geoms());
    }
}

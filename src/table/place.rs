use std::{fs::File, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Geometry, Point};
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{Column, CsvReader, DataType},
};

use crate::{crs::Crs, io::GeoFormat};
use super::GeoTable;

/// Label column written for every place.
pub const NAME_COLUMN: &str = "name";

/// A named point location.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub location: Point<f64>, // (lon, lat)
}

impl Place {
    pub fn new(name: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self { name: name.into(), location: Point::new(longitude, latitude) }
    }

    #[inline] pub fn longitude(&self) -> f64 { self.location.x() }

    #[inline] pub fn latitude(&self) -> f64 { self.location.y() }
}

/// Column names used when building places from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvColumns {
    pub name: String,
    pub longitude: String,
    pub latitude: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            name: NAME_COLUMN.to_string(),
            longitude: "longitude".to_string(),
            latitude: "latitude".to_string(),
        }
    }
}

/// Ordered places sharing one CRS (EPSG:4326 when built here).
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCollection {
    crs: Crs,
    places: Vec<Place>,
}

impl PlaceCollection {
    /// Pair labels with points. Coordinates are not range-checked.
    pub fn new(labels: Vec<String>, points: Vec<Point<f64>>) -> Result<Self> {
        if labels.len() != points.len() {
            bail!(
                "[PlaceCollection::new] {} labels but {} points",
                labels.len(),
                points.len()
            );
        }
        let places = labels.into_iter().zip(points)
            .map(|(name, location)| Place { name, location })
            .collect();
        Ok(Self { crs: Crs::WGS84, places })
    }

    /// Build from (label, longitude, latitude) triples.
    pub fn from_triples<S, I>(triples: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64, f64)>,
    {
        let places = triples.into_iter()
            .map(|(name, lon, lat)| Place::new(name, lon, lat))
            .collect();
        Self { crs: Crs::WGS84, places }
    }

    /// Build from a CSV file holding a label column and longitude/latitude columns.
    pub fn from_csv(path: &Path, columns: &CsvColumns) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        let df = CsvReader::new(file)
            .finish()
            .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;
        Self::from_dataframe(&df, columns)
    }

    /// Build from a frame with a label column and longitude/latitude columns.
    pub fn from_dataframe(df: &DataFrame, columns: &CsvColumns) -> Result<Self> {
        let get = |name: &str, dtype: &DataType| -> Result<Column> {
            df.column(name)
                .with_context(|| format!("[PlaceCollection::from_dataframe] Missing column {name:?}"))?
                .cast(dtype)
                .with_context(|| format!("[PlaceCollection::from_dataframe] Column {name:?} is not {dtype}"))
        };

        let names = get(&columns.name, &DataType::String)?;
        let lons = get(&columns.longitude, &DataType::Float64)?;
        let lats = get(&columns.latitude, &DataType::Float64)?;

        let (names, lons, lats) = (names.str()?, lons.f64()?, lats.f64()?);
        let mut places = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let name = names.get(row).unwrap_or_default().to_string();
            let (Some(lon), Some(lat)) = (lons.get(row), lats.get(row)) else {
                bail!("[PlaceCollection::from_dataframe] Row {row} ({name:?}) has no coordinates");
            };
            places.push(Place::new(name, lon, lat));
        }
        Ok(Self { crs: Crs::WGS84, places })
    }

    /// View a read-back table as places: a `name` column and point geometries.
    /// The table must carry a CRS; an untagged layer is not assumed to be lon/lat.
    pub fn from_table(table: &GeoTable) -> Result<Self> {
        let Some(crs) = table.crs() else {
            bail!("[PlaceCollection::from_table] Table has no CRS; tag it or reproject it first");
        };
        let name_column = table.find_column(NAME_COLUMN)
            .with_context(|| format!("[PlaceCollection::from_table] Missing column {NAME_COLUMN:?}"))?;

        let places = table.geoms().iter().enumerate()
            .map(|(row, geometry)| {
                let Geometry::Point(location) = geometry else {
                    bail!("[PlaceCollection::from_table] Row {row} is not a point");
                };
                let name = table.value(&name_column, row)?.as_string().unwrap_or_default();
                Ok(Place { name, location: *location })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { crs, places })
    }

    /// The table form: one `name` column and one point per row.
    pub fn to_table(&self) -> Result<GeoTable> {
        let names: Vec<&str> = self.places.iter().map(|p| p.name.as_str()).collect();
        let data = DataFrame::new(vec![Column::new(NAME_COLUMN.into(), names)])?;
        let geoms = self.places.iter().map(|p| Geometry::Point(p.location)).collect();
        GeoTable::new(data, geoms, Some(self.crs))
    }

    /// Write to `path` in `format`, replacing any existing file.
    pub fn write_to(&self, path: &Path, format: GeoFormat) -> Result<()> {
        self.to_table()?.write_to(path, format)
    }

    /// Write to `path`, choosing the format from its extension.
    pub fn write(&self, path: &Path) -> Result<()> {
        self.write_to(path, GeoFormat::from_path(path)?)
    }

    #[inline] pub fn crs(&self) -> Crs { self.crs }

    #[inline] pub fn len(&self) -> usize { self.places.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.places.is_empty() }

    #[inline] pub fn places(&self) -> &[Place] { &self.places }

    pub fn iter(&self) -> impl Iterator<Item = &Place> { self.places.iter() }
}

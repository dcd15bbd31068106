use std::{fmt, path::Path};

use anyhow::{anyhow, Result};
use geo::MultiPolygon;
use serde::Serialize;

use crate::geom::as_multipolygon;
use super::{value::AttrValue, GeoTable};

/// Travel mode as written by the routing tool; unrecognized labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
    Cycling,
    Driving,
    Other(String),
}

impl TravelMode {
    /// Map routing-profile labels (`foot-walking`, `cycling-regular`, `driving-car`, ...) to a mode.
    /// Only the leading token of the label is matched, as a whole word.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let lower = label.to_ascii_lowercase();
        let head = lower.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match head {
            "foot" | "walk" | "walking" | "hiking" => TravelMode::Walking,
            "cycling" | "cycle" | "bike" | "bicycle" => TravelMode::Cycling,
            "driving" | "drive" | "car" | "hgv" => TravelMode::Driving,
            _ => TravelMode::Other(label.to_string()),
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Walking => write!(f, "walking"),
            TravelMode::Cycling => write!(f, "cycling"),
            TravelMode::Driving => write!(f, "driving"),
            TravelMode::Other(label) => write!(f, "{label}"),
        }
    }
}

/// One reachable-area polygon around a center point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Isochrone {
    pub center_longitude: f64,
    pub center_latitude: f64,
    pub radius_value: f64,
    pub radius_unit: String,
    pub travel_mode: TravelMode,
    pub attribute_population: Option<i64>,
    #[serde(skip)]
    pub polygon: MultiPolygon<f64>,
}

/// Alternative column names, lowercase; the first present wins.
const CENTER_LON: &[&str] = &["center_longitude", "center_lon"];
const CENTER_LAT: &[&str] = &["center_latitude", "center_lat"];
const MODE: &[&str] = &["travel_mode", "aa_mode", "profile"];
const POPULATION: &[&str] = &["attribute_population", "total_pop", "population"];

/// Radius columns in lookup order, with the unit each implies (None: read `radius_unit`).
const RADIUS: &[(&str, Option<&str>)] = &[
    ("radius_value", None),
    ("aa_meters", Some("meters")),
    ("aa_mins", Some("minutes")),
    ("value", None),
];

/// An isochrone layer produced by an external routing tool, loaded as-is.
#[derive(Debug, Clone)]
pub struct IsochroneTable {
    table: GeoTable,
}

impl IsochroneTable {
    /// Load a container file fully into memory. No schema is enforced here.
    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self { table: GeoTable::read(path)? })
    }

    pub fn from_table(table: GeoTable) -> Self { Self { table } }

    #[inline] pub fn table(&self) -> &GeoTable { &self.table }

    pub fn into_table(self) -> GeoTable { self.table }

    #[inline] pub fn len(&self) -> usize { self.table.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.table.is_empty() }

    fn lookup(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| self.table.find_column(alias))
    }

    /// Typed view of every row.
    pub fn isochrones(&self) -> Result<Vec<Isochrone>> {
        let lon_col = self.lookup(CENTER_LON);
        let lat_col = self.lookup(CENTER_LAT);
        let mode_col = self.lookup(MODE);
        let pop_col = self.lookup(POPULATION);
        let unit_col = self.table.find_column("radius_unit");
        let radius_col = RADIUS.iter()
            .find_map(|(alias, unit)| self.table.find_column(alias).map(|name| (name, *unit)));

        let required = |row: usize, field: &str, column: &Option<String>| -> Result<AttrValue> {
            let column = column.as_deref()
                .ok_or_else(|| anyhow!("[IsochroneTable::isochrones] Row {row}: no column for {field}"))?;
            match self.table.value(column, row)? {
                AttrValue::Null => Err(anyhow!("[IsochroneTable::isochrones] Row {row}: {field} ({column}) is null")),
                value => Ok(value),
            }
        };
        let number = |row: usize, field: &str, column: &Option<String>| -> Result<f64> {
            required(row, field, column)?.as_f64()
                .ok_or_else(|| anyhow!("[IsochroneTable::isochrones] Row {row}: {field} is not a number"))
        };

        (0..self.table.len()).map(|row| {
            let polygon = as_multipolygon(&self.table.geoms()[row])
                .ok_or_else(|| anyhow!("[IsochroneTable::isochrones] Row {row}: geometry is not a polygon"))?;

            let (radius_name, implied_unit) = match &radius_col {
                Some((name, unit)) => (Some(name.clone()), *unit),
                None => (None, None),
            };
            let radius_value = number(row, "radius", &radius_name)?;
            let radius_unit = match implied_unit {
                Some(unit) => unit.to_string(),
                None => match &unit_col {
                    Some(col) => self.table.value(col, row)?.as_string().unwrap_or_else(|| "unknown".into()),
                    None => "unknown".to_string(),
                },
            };

            let mode = required(row, "travel mode", &mode_col)?.as_string().unwrap_or_default();
            let attribute_population = match &pop_col {
                Some(col) => self.table.value(col, row)?.as_i64(),
                None => None,
            };

            Ok(Isochrone {
                center_longitude: number(row, "center longitude", &lon_col)?,
                center_latitude: number(row, "center latitude", &lat_col)?,
                radius_value,
                radius_unit,
                travel_mode: TravelMode::from_label(&mode),
                attribute_population,
                polygon,
            })
        }).collect()
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Geometry, Point};
    use polars::prelude::{Column, DataFrame};

    use super::{IsochroneTable, TravelMode};
    use crate::{crs::Crs, table::GeoTable};

    fn square() -> Geometry<f64> {
        Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)])
    }

    #[test]
    fn travel_mode_labels() {
        assert_eq!(TravelMode::from_label("foot-walking"), TravelMode::Walking);
        assert_eq!(TravelMode::from_label("cycling-regular"), TravelMode::Cycling);
        assert_eq!(TravelMode::from_label("driving-car"), TravelMode::Driving);
        assert_eq!(TravelMode::from_label("Walking"), TravelMode::Walking);
        assert_eq!(TravelMode::from_label(" wheelchair "), TravelMode::Other("wheelchair".into()));
        assert_eq!(TravelMode::from_label("hgv"), TravelMode::Driving);
        assert_eq!(TravelMode::from_label("bike_electric"), TravelMode::Cycling);
        assert_eq!(TravelMode::Driving.to_string(), "driving");
    }

    #[test]
    fn travel_mode_ignores_partial_words() {
        for label in ["motorcycle", "motorbike", "scar", "footbridge-car"] {
            assert_eq!(TravelMode::from_label(label), TravelMode::Other(label.into()), "{label}");
        }
    }

    #[test]
    fn canonical_columns() {
        let df = DataFrame::new(vec![
            Column::new("center_longitude".into(), vec![-1.47f64]),
            Column::new("center_latitude".into(), vec![53.38f64]),
            Column::new("radius_value".into(), vec![10i64]),
            Column::new("radius_unit".into(), vec!["minutes"]),
            Column::new("travel_mode".into(), vec!["cycling"]),
            Column::new("attribute_population".into(), vec![1200i64]),
        ]).unwrap();
        let table = IsochroneTable::from_table(GeoTable::new(df, vec![square()], Some(Crs::WGS84)).unwrap());

        let isochrones = table.isochrones().unwrap();
        assert_eq!(isochrones.len(), 1);
        let iso = &isochrones[0];
        assert_eq!(iso.radius_value, 10.0);
        assert_eq!(iso.radius_unit, "minutes");
        assert_eq!(iso.travel_mode, TravelMode::Cycling);
        assert_eq!(iso.attribute_population, Some(1200));
        assert_eq!(iso.polygon.0.len(), 1);
    }

    #[test]
    fn missing_mode_names_the_field() {
        let df = DataFrame::new(vec![
            Column::new("CENTER_LON".into(), vec![-1.47f64]),
            Column::new("CENTER_LAT".into(), vec![53.38f64]),
            Column::new("AA_METERS".into(), vec![500i64]),
        ]).unwrap();
        let table = IsochroneTable::from_table(GeoTable::new(df, vec![square()], None).unwrap());
        let err = table.isochrones().unwrap_err();
        assert!(err.to_string().contains("travel mode"), "{err}");
    }

    #[test]
    fn point_geometry_is_rejected() {
        let df = DataFrame::new(vec![
            Column::new("CENTER_LON".into(), vec![-1.47f64]),
            Column::new("CENTER_LAT".into(), vec![53.38f64]),
            Column::new("AA_MINS".into(), vec![5i64]),
            Column::new("AA_MODE".into(), vec!["foot-walking"]),
        ]).unwrap();
        let geoms = vec![Geometry::Point(Point::new(-1.47, 53.38))];
        let table = IsochroneTable::from_table(GeoTable::new(df, geoms, None).unwrap());
        assert!(table.isochrones().is_err());
    }
}

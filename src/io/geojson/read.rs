//! GeoJSON reading.

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::Value;

use crate::{
    crs::Crs,
    table::{value::{frame_from_builders, AttrValue, ColumnBuilder}, GeoTable},
};

/// Read a GeoJSON FeatureCollection (or a single Feature) into a table.
pub(crate) fn read_geojson(path: &Path) -> Result<GeoTable> {
    let file = File::open(path)
        .with_context(|| format!("[io::geojson::read] Failed to open GeoJSON file: {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::geojson::read] Failed to parse GeoJSON: {}", path.display()))?;

    from_geojson_value(&value)
        .with_context(|| format!("[io::geojson::read] Not a GeoJSON feature layer: {}", path.display()))
}

/// Build a table from a parsed GeoJSON value.
pub(crate) fn from_geojson_value(value: &Value) -> Result<GeoTable> {
    let features: Vec<&Value> = match value["type"].as_str() {
        Some("FeatureCollection") => value["features"].as_array()
            .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?
            .iter().collect(),
        Some("Feature") => vec![value],
        Some(other) => bail!("Expected a FeatureCollection or Feature, found {other:?}"),
        None => bail!("Missing GeoJSON \"type\" member"),
    };

    let crs = match value["crs"]["properties"]["name"].as_str() {
        Some(name) => match name.parse::<Crs>() {
            Ok(crs) => Some(crs),
            Err(err) => {
                log::warn!("Leaving layer untagged: {err}");
                None
            }
        },
        None => Some(Crs::WGS84), // RFC 7946 default
    };

    let mut builders: Vec<ColumnBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut geoms = Vec::with_capacity(features.len());

    for (row, feature) in features.into_iter().enumerate() {
        geoms.push(parse_geometry(&feature["geometry"]).with_context(|| format!("Feature {row}: bad geometry"))?);

        if let Some(properties) = feature["properties"].as_object() {
            for (key, value) in properties {
                let slot = *index.entry(key.clone()).or_insert_with(|| {
                    builders.push(ColumnBuilder::new(key, row));
                    builders.len() - 1
                });
                builders[slot].push(json_to_attr(value));
            }
        }
        // Keys this feature lacks.
        for builder in builders.iter_mut().filter(|b| b.len() == row) {
            builder.push(AttrValue::Null);
        }
    }

    GeoTable::new(frame_from_builders(builders)?, geoms, crs)
}

fn json_to_attr(value: &Value) -> AttrValue {
    match value {
        Value::Null => AttrValue::Null,
        Value::Bool(b) => AttrValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttrValue::Int(i),
            None => n.as_f64().map(AttrValue::Float).unwrap_or(AttrValue::Null),
        },
        Value::String(s) => AttrValue::Str(s.clone()),
        other => AttrValue::Str(other.to_string()),
    }
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pair = value.as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| anyhow!("Invalid position: {value}"))?;
    let x = pair[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
    let y = pair[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
    Ok(Coord { x, y })
}

fn parse_positions(value: &Value) -> Result<Vec<Coord<f64>>> {
    value.as_array()
        .ok_or_else(|| anyhow!("Expected an array of positions"))?
        .iter()
        .map(parse_position)
        .collect()
}

/// Parse a ring, closing it if the first and last positions differ.
fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let mut points = parse_positions(value)?;
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }
    Ok(LineString(points))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array().ok_or_else(|| anyhow!("Expected an array of rings"))?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or_else(|| anyhow!("Polygon is missing its exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn array_of<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value.as_array()
        .ok_or_else(|| anyhow!("Expected an array"))?
        .iter()
        .map(parse)
        .collect()
}

/// Parse a GeoJSON geometry; `null` becomes an empty geometry collection.
pub(crate) fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    if value.is_null() {
        return Ok(Geometry::GeometryCollection(GeometryCollection::default()));
    }

    let coords = &value["coordinates"];
    let geometry = match value["type"].as_str() {
        Some("Point") => Geometry::Point(Point(parse_position(coords)?)),
        Some("MultiPoint") => Geometry::MultiPoint(MultiPoint(
            parse_positions(coords)?.into_iter().map(Point).collect(),
        )),
        Some("LineString") => Geometry::LineString(LineString(parse_positions(coords)?)),
        Some("MultiLineString") => Geometry::MultiLineString(MultiLineString(
            array_of(coords, |v| parse_positions(v).map(LineString))?,
        )),
        Some("Polygon") => Geometry::Polygon(parse_polygon(coords)?),
        Some("MultiPolygon") => Geometry::MultiPolygon(MultiPolygon(array_of(coords, parse_polygon)?)),
        Some("GeometryCollection") => Geometry::GeometryCollection(GeometryCollection(
            array_of(&value["geometries"], parse_geometry)?,
        )),
        Some(other) => bail!("Unsupported geometry type {other:?}"),
        None => bail!("Geometry has no \"type\" member"),
    };
    Ok(geometry)
}

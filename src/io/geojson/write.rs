//! GeoJSON writing.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, Polygon};
use serde_json::{json, Map, Value};

use crate::table::{value::AttrValue, GeoTable};

/// Write `table` as a FeatureCollection, replacing any existing file.
pub(crate) fn write_geojson(table: &GeoTable, path: &Path) -> Result<()> {
    let collection = to_feature_collection(table, layer_name(path))?;

    let file = File::create(path)
        .with_context(|| format!("[io::geojson::write] Failed to create GeoJSON file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &collection)
        .with_context(|| format!("[io::geojson::write] Failed to write GeoJSON to {}", path.display()))
}

fn layer_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Build the FeatureCollection value for `table`.
pub(crate) fn to_feature_collection(table: &GeoTable, name: Option<&str>) -> Result<Value> {
    let names = table.column_names();

    let mut features = Vec::with_capacity(table.len());
    for (row, geometry) in table.geoms().iter().enumerate() {
        let mut properties = Map::new();
        for column in &names {
            properties.insert(column.clone(), attr_to_json(table.value(column, row)?));
        }
        features.push(json!({
            "type": "Feature",
            "properties": properties,
            "geometry": geometry_to_geojson(geometry),
        }));
    }

    let mut collection = Map::new();
    collection.insert("type".into(), json!("FeatureCollection"));
    if let Some(name) = name {
        collection.insert("name".into(), json!(name));
    }
    if let Some(crs) = table.crs() {
        collection.insert("crs".into(), json!({ "type": "name", "properties": { "name": crs.urn() } }));
    }
    collection.insert("features".into(), Value::Array(features));
    Ok(Value::Object(collection))
}

fn attr_to_json(value: AttrValue) -> Value {
    match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(b) => json!(b),
        AttrValue::Int(i) => json!(i),
        // NaN and infinities have no JSON form.
        AttrValue::Float(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        AttrValue::Str(s) => json!(s),
    }
}

fn position(c: &Coord<f64>) -> Value {
    json!([c.x, c.y])
}

fn line_coords(ls: &LineString<f64>) -> Value {
    Value::Array(ls.coords().map(position).collect())
}

fn polygon_coords(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![line_coords(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(line_coords));
    Value::Array(rings)
}

/// Convert a geometry to its GeoJSON value; an empty collection is written as `null`.
pub(crate) fn geometry_to_geojson(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| position(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::Line(line) => json!({
            "type": "LineString",
            "coordinates": [position(&line.start), position(&line.end)],
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": line_coords(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(line_coords).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_coords(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_coords).collect::<Vec<_>>(),
        }),
        Geometry::Rect(r) => json!({ "type": "Polygon", "coordinates": polygon_coords(&r.to_polygon()) }),
        Geometry::Triangle(t) => json!({ "type": "Polygon", "coordinates": polygon_coords(&t.to_polygon()) }),
        Geometry::GeometryCollection(gc) if gc.0.is_empty() => Value::Null,
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.0.iter().map(geometry_to_geojson).collect::<Vec<_>>(),
        }),
    }
}

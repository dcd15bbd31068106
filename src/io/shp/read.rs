//! Shapefile reading.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use shapefile::{dbase::{FieldValue, Record}, Reader, Shape};

use crate::{
    crs::Crs,
    geom::shape_to_geometry,
    table::{value::{frame_from_builders, AttrValue, ColumnBuilder}, GeoTable},
};

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapes_and_records(path: &Path) -> Result<Vec<(Shape, Record)>> {
    // Surface a plain io::Error (e.g. NotFound) before the shapefile reader wraps it.
    fs::metadata(path)
        .with_context(|| format!("[io::shp::read] Failed to open shapefile: {}", path.display()))?;

    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp::read] Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shp::read] Error reading shape+record")?;
        items.push((shape, record));
    }
    Ok(items)
}

/// Read a Shapefile and its `.dbf`/`.prj` sidecars into a table.
/// Attribute columns come back sorted by name, as the `.dbf` records carry no order.
pub(crate) fn read_shapefile(path: &Path) -> Result<GeoTable> {
    let items = read_shapes_and_records(path)?;

    let mut names: Vec<String> = items.first()
        .map(|(_, record)| record.clone().into_iter().map(|(name, _)| name).collect())
        .unwrap_or_default();
    names.sort();

    let mut builders: Vec<ColumnBuilder> = names.iter().map(|n| ColumnBuilder::new(n, 0)).collect();
    let mut geoms = Vec::with_capacity(items.len());

    for (row, (shape, record)) in items.into_iter().enumerate() {
        geoms.push(shape_to_geometry(shape).with_context(|| format!("[io::shp::read] Row {row}"))?);

        let mut fields: HashMap<String, FieldValue> = record.into_iter().collect();
        for (name, builder) in names.iter().zip(builders.iter_mut()) {
            builder.push(fields.remove(name).map(field_to_attr).unwrap_or(AttrValue::Null));
        }
    }

    GeoTable::new(frame_from_builders(builders)?, geoms, read_prj(path)?)
}

/// The CRS declared by the `.prj` sidecar, if there is one we recognize.
fn read_prj(path: &Path) -> Result<Option<Crs>> {
    let prj = path.with_extension("prj");
    if !prj.exists() {
        log::debug!("[io::shp::read] no .prj next to {}", path.display());
        return Ok(None);
    }
    let wkt = fs::read_to_string(&prj)
        .with_context(|| format!("[io::shp::read] Failed to read {}", prj.display()))?;
    let crs = Crs::from_wkt(&wkt);
    if crs.is_none() {
        log::warn!("Unrecognized CRS in {}", prj.display());
    }
    Ok(crs)
}

/// Numeric dBase fields carry no integer/float distinction per value; integral values read as integers.
fn field_to_attr(value: FieldValue) -> AttrValue {
    let number = |f: f64| {
        if f.fract() == 0.0 && f.abs() < 9.0e15 { AttrValue::Int(f as i64) } else { AttrValue::Float(f) }
    };
    match value {
        FieldValue::Character(Some(s)) => AttrValue::Str(s),
        FieldValue::Character(None) => AttrValue::Null,
        FieldValue::Memo(s) => AttrValue::Str(s),
        FieldValue::Numeric(Some(f)) => number(f),
        FieldValue::Numeric(None) => AttrValue::Null,
        FieldValue::Float(Some(f)) => AttrValue::Float(f as f64),
        FieldValue::Float(None) => AttrValue::Null,
        FieldValue::Integer(i) => AttrValue::Int(i as i64),
        FieldValue::Double(f) => AttrValue::Float(f),
        FieldValue::Currency(f) => AttrValue::Float(f),
        FieldValue::Logical(Some(b)) => AttrValue::Bool(b),
        FieldValue::Logical(None) => AttrValue::Null,
        FieldValue::Date(Some(d)) => AttrValue::Str(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        FieldValue::Date(None) => AttrValue::Null,
        other => AttrValue::Str(format!("{other:?}")),
    }
}

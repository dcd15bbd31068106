//! Shapefile writing.

use std::{collections::HashSet, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry, LineString};
use polars::prelude::DataType;
use shapefile::{dbase::{FieldName, FieldValue, Record, TableWriterBuilder}, Writer};

use crate::{
    geom::{as_multipolygon, geo_to_shp, geo_to_shp_multipoint, geo_to_shp_point, geo_to_shp_polyline, ShapeKind},
    table::{value::AttrValue, GeoTable},
};

/// dBase field names are limited to 10 characters.
const MAX_FIELD_NAME: usize = 10;
const MAX_CHARACTER_LENGTH: usize = 254;

/// How a table column is laid out in the `.dbf`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldKind { Character(u8), Integer, Real, Logical }

#[derive(Debug)]
struct Field {
    column: String,
    name: String,
    kind: FieldKind,
}

/// Plan the `.dbf` fields for `table`, truncating names to the dBase limit.
fn plan_fields(table: &GeoTable) -> Result<Vec<Field>> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();

    for column in table.data().get_columns() {
        let full = column.name().to_string();
        let name: String = full.chars().take(MAX_FIELD_NAME).collect();
        if name != full {
            log::warn!("Shapefile field name {full:?} truncated to {name:?}");
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            bail!("[io::shp::write] Field name {name:?} (from {full:?}) collides with another column");
        }

        let kind = match column.dtype() {
            DataType::Boolean => FieldKind::Logical,
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => FieldKind::Integer,
            DataType::Float32 | DataType::Float64 => FieldKind::Real,
            _ => {
                let longest = (0..table.len())
                    .map(|row| table.value(&full, row).map(|v| v.as_string().map_or(0, |s| s.len())))
                    .collect::<Result<Vec<_>>>()?
                    .into_iter()
                    .max()
                    .unwrap_or(0);
                FieldKind::Character(longest.clamp(1, MAX_CHARACTER_LENGTH) as u8)
            }
        };
        fields.push(Field { column: full, name, kind });
    }
    Ok(fields)
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn table_builder(fields: &[Field]) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for field in fields {
        let name = FieldName::try_from(field.name.as_str())
            .map_err(|e| anyhow!("[io::shp::write] Invalid field name {:?}: {e:?}", field.name))?;
        builder = match field.kind {
            FieldKind::Character(length) => builder.add_character_field(name, length),
            FieldKind::Integer => builder.add_numeric_field(name, 18, 0),
            FieldKind::Real => builder.add_numeric_field(name, 24, 15),
            FieldKind::Logical => builder.add_logical_field(name),
        };
    }
    Ok(builder)
}

fn record(table: &GeoTable, fields: &[Field], row: usize) -> Result<Record> {
    let mut record = Record::default();
    for field in fields {
        let value = table.value(&field.column, row)?;
        let value = match field.kind {
            FieldKind::Character(length) => FieldValue::Character(value.as_string().map(|s| {
                let kept = truncate_bytes(&s, length as usize);
                if kept.len() < s.len() {
                    log::warn!("Row {row}: {:?} truncated to {length} bytes", field.column);
                }
                kept.to_string()
            })),
            FieldKind::Integer | FieldKind::Real => FieldValue::Numeric(value.as_f64()),
            FieldKind::Logical => FieldValue::Logical(match value {
                AttrValue::Bool(b) => Some(b),
                _ => None,
            }),
        };
        record.insert(field.name.clone(), value);
    }
    Ok(record)
}

/// The single shape kind shared by every row.
fn shape_kind(table: &GeoTable) -> Result<ShapeKind> {
    let mut kind = None;
    for (row, geometry) in table.geoms().iter().enumerate() {
        let Some(this) = ShapeKind::of(geometry)? else {
            bail!("[io::shp::write] Row {row} has no geometry; Shapefile output needs one per row");
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => bail!("[io::shp::write] Row {row} is a {this:?} but earlier rows are {k:?}"),
            Some(_) => {}
        }
    }
    Ok(kind.unwrap_or(ShapeKind::Point))
}

fn lines(geometry: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::Line(line) => vec![LineString::from(vec![line.start, line.end])],
        Geometry::LineString(ls) => vec![ls.clone()],
        Geometry::MultiLineString(mls) => mls.0.clone(),
        _ => Vec::new(),
    }
}

/// Write `table` as `.shp`/`.shx`/`.dbf` (+ `.prj` when the CRS has a WKT), replacing existing files.
pub(crate) fn write_shapefile(table: &GeoTable, path: &Path) -> Result<()> {
    let kind = shape_kind(table)?;
    let fields = plan_fields(table)?;
    let records = (0..table.len())
        .map(|row| record(table, &fields, row))
        .collect::<Result<Vec<_>>>()?;

    let mut writer = Writer::from_path(path, table_builder(&fields)?)
        .with_context(|| format!("[io::shp::write] Failed to create shapefile: {}", path.display()))?;

    macro_rules! write_rows {
        ($to_shape:expr) => {{
            let to_shape = $to_shape;
            for (row, (geometry, record)) in table.geoms().iter().zip(&records).enumerate() {
                let shape = to_shape(geometry)
                    .ok_or_else(|| anyhow!("[io::shp::write] Row {row} does not match shape kind {kind:?}"))?;
                writer.write_shape_and_record(&shape, record)
                    .with_context(|| format!("[io::shp::write] Failed to write row {row} to {}", path.display()))?;
            }
        }};
    }

    match kind {
        ShapeKind::Point => write_rows!(|g: &Geometry<f64>| match g {
            Geometry::Point(p) => Some(geo_to_shp_point(p)),
            _ => None,
        }),
        ShapeKind::Multipoint => write_rows!(|g: &Geometry<f64>| match g {
            Geometry::MultiPoint(mp) => Some(geo_to_shp_multipoint(mp)),
            _ => None,
        }),
        ShapeKind::Polyline => write_rows!(|g: &Geometry<f64>| {
            let parts = lines(g);
            (!parts.is_empty()).then(|| geo_to_shp_polyline(&parts))
        }),
        ShapeKind::Polygon => write_rows!(|g: &Geometry<f64>| as_multipolygon(g).map(|mp| geo_to_shp(&mp))),
    }
    drop(writer);

    write_prj(table, path)
}

/// Write the `.prj` sidecar, or remove a stale one when there is nothing to declare.
fn write_prj(table: &GeoTable, path: &Path) -> Result<()> {
    let prj = path.with_extension("prj");
    match table.crs().map(|crs| (crs, crs.esri_wkt())) {
        Some((_, Some(wkt))) => fs::write(&prj, wkt)
            .with_context(|| format!("[io::shp::write] Failed to write {}", prj.display())),
        other => {
            if let Some((crs, None)) = other {
                log::warn!("No .prj definition for {crs}; {} is written without one", path.display());
            }
            if prj.exists() {
                fs::remove_file(&prj)
                    .with_context(|| format!("[io::shp::write] Failed to remove stale {}", prj.display()))?;
            }
            Ok(())
        }
    }
}

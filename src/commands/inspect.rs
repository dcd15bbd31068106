use std::collections::BTreeMap;

use anyhow::{Context, Result};
use geo::Geometry;

use crate::cli::{Cli, InspectArgs};
use crate::table::{GeoTable, IsochroneTable};

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(gc) if gc.0.is_empty() => "Null",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Summary of a table: rows, CRS, geometry mix and attribute columns.
fn print_summary(table: &GeoTable) {
    println!("Number of records: {}", table.len());
    match table.crs() {
        Some(crs) => println!("CRS: {crs}"),
        None => println!("CRS: unknown"),
    }

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for geometry in table.geoms() {
        *counts.entry(geometry_name(geometry)).or_default() += 1;
    }
    println!("Geometry mix:");
    for (k, v) in counts {
        println!("  - {}: {}", k, v);
    }

    println!("Attribute columns:");
    for column in table.data().get_columns() {
        println!("  - {} ({})", column.name(), column.dtype());
    }
}

pub fn run(cli: &Cli, args: &InspectArgs) -> Result<()> {
    let table = GeoTable::read(&args.input)?;
    if !args.json {
        print_summary(&table);
    }

    if args.isochrones {
        let isochrones = IsochroneTable::from_table(table).isochrones()
            .with_context(|| format!("{} does not look like an isochrone layer", args.input.display()))?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&isochrones)?);
        } else {
            println!("Isochrones:");
            for (i, iso) in isochrones.iter().enumerate() {
                let population = iso.attribute_population.map_or("-".to_string(), |p| p.to_string());
                println!(
                    "  {:>3}: center=({:.6}, {:.6}) {} {} {} population={}",
                    i, iso.center_longitude, iso.center_latitude,
                    iso.travel_mode, iso.radius_value, iso.radius_unit, population
                );
                if cli.verbose > 1 {
                    println!("       polygons={}", iso.polygon.0.len());
                }
            }
        }
    }
    Ok(())
}

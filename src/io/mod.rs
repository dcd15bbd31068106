//! Container file formats for geometry tables.
//!
//! Each format module handles reading and writing for one file format:
//!
//! - `geojson` - GeoJSON FeatureCollection, CRS in the legacy `crs` member
//! - `shp` - ESRI Shapefile (`.shp`/`.shx`/`.dbf`), CRS in a `.prj` sidecar
//!
//! The format is chosen from the file extension unless the caller names one.

mod geojson;
mod shp;

use std::{fmt, path::Path};

use anyhow::{bail, Result};

use crate::table::GeoTable;

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoFormat {
    GeoJson,
    Shapefile,
}

impl GeoFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("geojson" | "json") => Ok(GeoFormat::GeoJson),
            Some("shp") => Ok(GeoFormat::Shapefile),
            Some(other) => bail!(
                "Unsupported file extension .{other} for {} (supported: .geojson, .json, .shp)",
                path.display()
            ),
            None => bail!("File has no extension, cannot pick a format: {}", path.display()),
        }
    }

    /// Preferred file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            GeoFormat::GeoJson => "geojson",
            GeoFormat::Shapefile => "shp",
        }
    }
}

impl fmt::Display for GeoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoFormat::GeoJson => write!(f, "GeoJSON"),
            GeoFormat::Shapefile => write!(f, "ESRI Shapefile"),
        }
    }
}

/// Read a whole container file; the format comes from the extension.
pub(crate) fn read_table(path: &Path) -> Result<GeoTable> {
    let table = match GeoFormat::from_path(path)? {
        GeoFormat::GeoJson => geojson::read_geojson(path)?,
        GeoFormat::Shapefile => shp::read_shapefile(path)?,
    };
    log::debug!("[io::read_table] {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Write a table, replacing whatever is at `path`.
pub(crate) fn write_table(table: &GeoTable, path: &Path, format: GeoFormat) -> Result<()> {
    match format {
        GeoFormat::GeoJson => geojson::write_geojson(table, path)?,
        GeoFormat::Shapefile => shp::write_shapefile(table, path)?,
    }
    log::info!("Wrote {} rows as {format} to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::GeoFormat;

    #[test]
    fn format_from_extension() {
        assert_eq!(GeoFormat::from_path(Path::new("places.geojson")).unwrap(), GeoFormat::GeoJson);
        assert_eq!(GeoFormat::from_path(Path::new("PLACES.JSON")).unwrap(), GeoFormat::GeoJson);
        assert_eq!(GeoFormat::from_path(Path::new("dir/schools.shp")).unwrap(), GeoFormat::Shapefile);
    }

    #[test]
    fn unsupported_extensions() {
        let err = GeoFormat::from_path(Path::new("isochrones.gpkg")).unwrap_err();
        assert!(err.to_string().contains(".gpkg"));
        assert!(GeoFormat::from_path(Path::new("README")).is_err());
        assert!(GeoFormat::from_path(Path::new("routes.kml")).is_err());
    }
}

use std::{fmt, str::FromStr, sync::OnceLock};

use anyhow::{anyhow, bail, Result};
use regex::Regex;

/// Coordinate reference system, identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// WGS84 longitude/latitude.
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// British National Grid.
    pub const BRITISH_NATIONAL_GRID: Crs = Crs { epsg: 27700 };

    pub const fn from_epsg(epsg: u32) -> Self { Self { epsg } }

    pub fn epsg(&self) -> u32 { self.epsg }

    /// True for CRSs whose coordinates are degrees of longitude/latitude.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4269 | 4258)
    }

    /// OGC URN form, as used by the GeoJSON `crs` member.
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }

    /// PROJ.4 definition used for reprojection.
    pub(crate) fn proj4(&self) -> Result<String> {
        let def = match self.epsg {
            4326 => "+proj=longlat +datum=WGS84 +no_defs +type=crs".to_string(),
            4269 => "+proj=longlat +datum=NAD83 +no_defs +type=crs".to_string(),
            4258 => "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs +type=crs".to_string(),
            3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs".to_string(),
            27700 => concat!(
                "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy ",
                "+towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs +type=crs"
            ).to_string(),
            code @ 32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs +type=crs", code - 32600),
            code @ 32701..=32760 => format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs +type=crs", code - 32700),
            code => bail!("[Crs::proj4] No projection definition for EPSG:{code}"),
        };
        Ok(def)
    }

    /// ESRI WKT for a Shapefile `.prj` sidecar, for the CRSs that have one here.
    pub(crate) fn esri_wkt(&self) -> Option<&'static str> {
        match self.epsg {
            4326 => Some(concat!(
                r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],"#,
                r#"PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#
            )),
            4269 => Some(concat!(
                r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],"#,
                r#"PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#
            )),
            27700 => Some(concat!(
                r#"PROJCS["British_National_Grid",GEOGCS["GCS_OSGB_1936",DATUM["D_OSGB_1936",SPHEROID["Airy_1830",6377563.396,299.3249646]],"#,
                r#"PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],"#,
                r#"PARAMETER["False_Easting",400000.0],PARAMETER["False_Northing",-100000.0],PARAMETER["Central_Meridian",-2.0],"#,
                r#"PARAMETER["Scale_Factor",0.9996012717],PARAMETER["Latitude_Of_Origin",49.0],UNIT["Meter",1.0]]"#
            )),
            3857 => Some(concat!(
                r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],"#,
                r#"PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],"#,
                r#"PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",0.0],"#,
                r#"PARAMETER["Standard_Parallel_1",0.0],PARAMETER["Auxiliary_Sphere_Type",0.0],UNIT["Meter",1.0]]"#
            )),
            _ => None,
        }
    }

    /// Recognize a CRS from WKT (OGC or ESRI flavour).
    /// The outermost `AUTHORITY["EPSG", ...]` is the last one in WKT1; without one, fall back to known names.
    pub(crate) fn from_wkt(wkt: &str) -> Option<Crs> {
        static AUTHORITY: OnceLock<Regex> = OnceLock::new();
        let authority = AUTHORITY.get_or_init(|| {
            Regex::new(r#"AUTHORITY\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).expect("valid regex")
        });

        if let Some(code) = authority.captures_iter(wkt).last()
            .and_then(|caps| caps[1].parse::<u32>().ok()) {
            return Some(Crs::from_epsg(code));
        }

        let is_projected = wkt.trim_start().starts_with("PROJCS");
        let has = |needle: &str| wkt.contains(needle);
        if is_projected {
            if has("British_National_Grid") || has("OSGB 1936 / British National Grid") { return Some(Crs::from_epsg(27700)) }
            if has("Mercator_Auxiliary_Sphere") || has("Pseudo-Mercator") { return Some(Crs::from_epsg(3857)) }
            None
        } else if has("WGS_1984") || has("WGS 84") {
            Some(Crs::WGS84)
        } else if has("North_American_1983") || has("NAD83") {
            Some(Crs::from_epsg(4269))
        } else if has("ETRS_1989") || has("ETRS89") {
            Some(Crs::from_epsg(4258))
        } else {
            None
        }
    }
}

impl Default for Crs {
    fn default() -> Self { Crs::WGS84 }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower == "crs84" || lower == "ogc:crs84" || lower.ends_with(":ogc:1.3:crs84") {
            return Ok(Crs::WGS84);
        }

        // "EPSG:4326", "urn:ogc:def:crs:EPSG::4326", "urn:ogc:def:crs:EPSG:6.6:4326" all end in the code.
        let code = if lower.starts_with("epsg:") || lower.starts_with("urn:ogc:def:crs:epsg:") {
            lower.rsplit(':').next().unwrap_or_default()
        } else {
            lower.as_str()
        };

        code.parse::<u32>()
            .map(Crs::from_epsg)
            .map_err(|_| anyhow!("Unrecognized CRS: {trimmed:?}"))
    }
}

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use crate::io::GeoFormat;

/// Prepare place layers for isochrone generation and inspect the results
#[derive(Parser, Debug)]
#[command(name = "isoprep", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a point layer of named places from a CSV file
    Places(PlacesArgs),

    /// Summarize a container file (rows, CRS, geometry, columns)
    Inspect(InspectArgs),

    /// Reproject a container file, or a directory of them, to another CRS
    Convert(ConvertArgs),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum OutputFormat { Geojson, Shapefile }

impl From<OutputFormat> for GeoFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Geojson => GeoFormat::GeoJson,
            OutputFormat::Shapefile => GeoFormat::Shapefile,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlacesArgs {
    /// Input CSV with a label column and longitude/latitude columns
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output container file (overwritten if it exists)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Label column
    #[arg(long, default_value = "name")]
    pub name_column: String,

    /// Longitude column
    #[arg(long, default_value = "longitude")]
    pub lon_column: String,

    /// Latitude column
    #[arg(long, default_value = "latitude")]
    pub lat_column: String,

    /// Output format (default: from the output extension)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Container file to read
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Also list every row as an isochrone
    #[arg(long)]
    pub isochrones: bool,

    /// Print isochrones as JSON instead of a table
    #[arg(long, requires = "isochrones")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Source file or directory
    #[arg(value_hint = ValueHint::AnyPath)]
    pub source: PathBuf,

    /// Destination file, or an existing directory when the source is one
    #[arg(value_hint = ValueHint::AnyPath)]
    pub destination: PathBuf,

    /// Target CRS, e.g. EPSG:27700
    #[arg(long)]
    pub crs: String,

    /// Skip unsupported files in a directory instead of failing
    #[arg(long)]
    pub skip_invalid: bool,
}

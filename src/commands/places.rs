use anyhow::Result;

use crate::cli::{Cli, PlacesArgs};
use crate::{common, io::GeoFormat, table::{CsvColumns, PlaceCollection}};

pub fn run(_cli: &Cli, args: &PlacesArgs) -> Result<()> {
    let columns = CsvColumns {
        name: args.name_column.clone(),
        longitude: args.lon_column.clone(),
        latitude: args.lat_column.clone(),
    };
    let format = match args.format {
        Some(format) => format.into(),
        None => GeoFormat::from_path(&args.output)?,
    };

    log::info!("[places] {} -> {} ({format})", args.input.display(), args.output.display());

    let places = PlaceCollection::from_csv(&args.input, &columns)?;
    common::ensure_parent_dir(&args.output)?;
    places.write_to(&args.output, format)?;

    println!("Wrote {} places ({}) -> {}", places.len(), places.crs(), args.output.display());
    Ok(())
}

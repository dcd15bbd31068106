#![doc = "Prepare point layers for isochrone generation and read isochrone layers back"]
pub mod cli;
pub mod commands;
mod common;
pub mod convert;
mod crs;
mod geom;
mod io;
mod table;

#[doc(inline)]
pub use crs::Crs;

#[doc(inline)]
pub use io::GeoFormat;

#[doc(inline)]
pub use table::{CsvColumns, GeoTable, Isochrone, IsochroneTable, Place, PlaceCollection, TravelMode, NAME_COLUMN};

#[doc(inline)]
pub use convert::{convert_dir, convert_file, ConvertOptions};

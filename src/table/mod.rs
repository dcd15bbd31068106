mod geo_table;
mod isochrone;
mod place;
pub(crate) mod value;

pub use geo_table::GeoTable;
pub use isochrone::{Isochrone, IsochroneTable, TravelMode};
pub use place::{CsvColumns, Place, PlaceCollection, NAME_COLUMN};

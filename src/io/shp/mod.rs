//! ESRI Shapefile reading and writing.

mod read;
mod write;

pub(crate) use read::*;
pub(crate) use write::*;

mod polygon;
mod proj;

pub(crate) use polygon::*;
pub(crate) use proj::*;

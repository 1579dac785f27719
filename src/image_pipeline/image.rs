//! Raster image data model
//!
//! An [`Image`] is a band-first pixel cube plus the georeferencing and tag
//! metadata that travelled with it from the source dataset.

mod data_type;
mod geotransform;
mod metadata;
pub mod types;

pub use data_type::DataType;
pub use geotransform::GeoTransform;
pub use metadata::{Gcp, Georeferencing, Metadata, Tags};
pub use types::{Bands, Image};

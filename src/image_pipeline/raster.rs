//! Raster IO module
//!
//! Drivers open and create datasets; datasets expose pixel data,
//! georeferencing and tags the way the pipeline's load and save stages
//! consume them. Two drivers are built in: `GTiff` for files on disk and
//! `MEM` for datasets that live only in memory.

mod driver;
mod gdal_metadata;
mod geotiff_driver;
mod mem_driver;
pub mod types;

pub use driver::{driver_by_name, RasterDataset, RasterDriver};
pub use geotiff_driver::{GeoTiffDataset, GeoTiffDriver};
pub use mem_driver::{MemDataset, MemDriver};
pub use types::RasterType;

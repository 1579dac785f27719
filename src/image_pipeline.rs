//! Geospatial raster pipeline module
//!
//! Pipelines are built from segments: small stages that each turn one
//! [`Value`] into another. Loaders read rasters through a driver into an
//! [`Image`], transform stages (statistics, band selection, stacking,
//! bounds) work on images, and sinks write or display them.
//!
//! ```no_run
//! use georaster_pipeline_rs::image_pipeline::{
//!     ImageStats, LoadImageFromDisk, SaveImage, Segment, SegmentExt, SelectBands,
//! };
//!
//! let pipeline = LoadImageFromDisk::new("scene.tif")
//!     .then(ImageStats::new())
//!     .then(SelectBands::new([2, 1, 0]))
//!     .then(SaveImage::new("scene_bgr.tif"));
//! pipeline.run()?;
//! # Ok::<(), georaster_pipeline_rs::image_pipeline::PipelineError>(())
//! ```

pub mod common;
pub mod image;
pub mod plot;
pub mod raster;
pub mod segment;
pub mod stages;


pub use common::{PipelineError, Result};

pub use image::{Bands, DataType, Gcp, GeoTransform, Georeferencing, Image, Metadata, Tags};

pub use segment::{compose, Chain, Identity, Merge, Segment, SegmentExt, Value};

pub use raster::{
    driver_by_name, GeoTiffDataset, GeoTiffDriver, MemDataset, MemDriver, RasterDataset, RasterDriver, RasterType,
};

pub use plot::{PlotBackend, PngPlotter};

pub use stages::{
    BandList, BandStats, Bounds, Envelope, ImageSource, ImageStats, LoadImage, LoadImageFromDisk,
    LoadImageFromMemory, MergeToStack, SaveImage, SaveOptions, SelectBands, SelectItem, ShowImage, ShowOptions,
    StatsOptions, StatsTable,
};

use std::path::Path;

use ndarray::{ArrayD, ArrayView2};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::{DataType, Gcp, GeoTransform, Tags};
use crate::image_pipeline::raster::{GeoTiffDriver, MemDataset, MemDriver, RasterType};

/// An opened or newly created raster dataset.
///
/// Band indices are one-based, as in the on-disk formats.
pub trait RasterDataset {
    fn raster_count(&self) -> usize;
    /// (columns, rows)
    fn size(&self) -> (usize, usize);
    fn data_type(&self) -> DataType;

    /// All pixels: (band, row, col), or (row, col) for single-band datasets.
    fn read_all(&self) -> Result<ArrayD<f64>>;

    fn geo_transform(&self) -> Option<GeoTransform>;
    fn projection_ref(&self) -> String;
    fn gcps(&self) -> Vec<Gcp>;
    fn gcp_projection(&self) -> String;
    fn global_tags(&self) -> Tags;
    fn band_tags(&self, band: usize) -> Tags;

    fn write_band(&mut self, band: usize, data: ArrayView2<'_, f64>) -> Result<()>;
    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result<()>;
    fn set_projection_ref(&mut self, projection: &str) -> Result<()>;
    fn set_gcps(&mut self, gcps: &[Gcp], projection: &str) -> Result<()>;
    fn set_global_tags(&mut self, tags: &Tags) -> Result<()>;
    fn flush(&mut self) -> Result<()>;

    /// The dataset itself when it lives purely in memory.
    fn into_memory(self: Box<Self>) -> Option<MemDataset> {
        None
    }
}

/// Opens and creates datasets of one format.
pub trait RasterDriver {
    fn name(&self) -> &str;

    /// `Ok(None)` when nothing this driver can read exists at `path`.
    fn open(&self, path: &Path) -> Result<Option<Box<dyn RasterDataset>>>;

    fn create(
        &self,
        path: &Path,
        cols: usize,
        rows: usize,
        bands: usize,
        raster_type: RasterType,
    ) -> Result<Box<dyn RasterDataset>>;
}

/// Resolves a driver by its short name, ignoring case.
pub fn driver_by_name(name: &str) -> Result<Box<dyn RasterDriver>> {
    if name.eq_ignore_ascii_case(GeoTiffDriver::NAME) {
        Ok(Box::new(GeoTiffDriver))
    } else if name.eq_ignore_ascii_case(MemDriver::NAME) {
        Ok(Box::new(MemDriver))
    } else {
        Err(PipelineError::UnknownDriver(name.to_string()))
    }
}

/// Checks a one-based band index and a band slice's shape against a dataset.
pub(crate) fn check_band_write(
    band: usize,
    bands: usize,
    data: &ArrayView2<'_, f64>,
    rows: usize,
    cols: usize,
) -> Result<()> {
    if band == 0 || band > bands {
        return Err(PipelineError::BandIndexOutOfRange { index: band, bands });
    }
    if data.dim() != (rows, cols) {
        return Err(ndarray::ShapeError::from_kind(ndarray::ErrorKind::IncompatibleShape).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_lookup_ignores_case() {
        assert_eq!(driver_by_name("gtiff").unwrap().name(), "GTiff");
        assert_eq!(driver_by_name("mem").unwrap().name(), "MEM");
    }

    #[test]
    fn test_unknown_driver() {
        assert!(matches!(
            driver_by_name("HFA"),
            Err(PipelineError::UnknownDriver(name)) if name == "HFA"
        ));
    }
}

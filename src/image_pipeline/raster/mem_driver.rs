//! In-memory raster driver

use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView2, Axis};
use tracing::debug;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::image::{DataType, Gcp, GeoTransform, Tags};
use crate::image_pipeline::raster::driver::check_band_write;
use crate::image_pipeline::raster::{RasterDataset, RasterDriver, RasterType};

/// Driver whose datasets never touch the filesystem.
///
/// `create` ignores its path and `open` never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemDriver;

impl MemDriver {
    pub const NAME: &'static str = "MEM";
}

impl RasterDriver for MemDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn open(&self, _path: &Path) -> Result<Option<Box<dyn RasterDataset>>> {
        Ok(None)
    }

    fn create(
        &self,
        _path: &Path,
        cols: usize,
        rows: usize,
        bands: usize,
        raster_type: RasterType,
    ) -> Result<Box<dyn RasterDataset>> {
        debug!("Creating in-memory dataset: {} bands, {}x{}, {}", bands, rows, cols, raster_type);
        Ok(Box::new(MemDataset::new(cols, rows, bands, raster_type)))
    }
}

/// Dataset held entirely in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemDataset {
    raster_type: RasterType,
    pixels: Array3<f64>,
    geo_transform: Option<GeoTransform>,
    projection_ref: String,
    gcps: Vec<Gcp>,
    gcp_projection: String,
    tags: Tags,
    band_tags: Vec<Tags>,
}

impl MemDataset {
    pub fn new(cols: usize, rows: usize, bands: usize, raster_type: RasterType) -> Self {
        Self {
            raster_type,
            pixels: Array3::zeros((bands, rows, cols)),
            geo_transform: None,
            projection_ref: String::new(),
            gcps: Vec::new(),
            gcp_projection: String::new(),
            tags: Tags::new(),
            band_tags: vec![Tags::new(); bands],
        }
    }

    pub fn raster_type(&self) -> RasterType {
        self.raster_type
    }

    /// Pixel values as stored, (band, row, col).
    pub fn pixels(&self) -> &Array3<f64> {
        &self.pixels
    }

    pub fn set_band_tags(&mut self, band: usize, tags: Tags) {
        if let Some(slot) = band.checked_sub(1).and_then(|i| self.band_tags.get_mut(i)) {
            *slot = tags;
        }
    }
}

impl RasterDataset for MemDataset {
    fn raster_count(&self) -> usize {
        self.pixels.len_of(Axis(0))
    }

    fn size(&self) -> (usize, usize) {
        let (_, rows, cols) = self.pixels.dim();
        (cols, rows)
    }

    fn data_type(&self) -> DataType {
        self.raster_type.data_type()
    }

    fn read_all(&self) -> Result<ArrayD<f64>> {
        if self.raster_count() == 1 {
            Ok(self.pixels.index_axis(Axis(0), 0).to_owned().into_dyn())
        } else {
            Ok(self.pixels.clone().into_dyn())
        }
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn projection_ref(&self) -> String {
        self.projection_ref.clone()
    }

    fn gcps(&self) -> Vec<Gcp> {
        self.gcps.clone()
    }

    fn gcp_projection(&self) -> String {
        self.gcp_projection.clone()
    }

    fn global_tags(&self) -> Tags {
        self.tags.clone()
    }

    fn band_tags(&self, band: usize) -> Tags {
        band.checked_sub(1)
            .and_then(|i| self.band_tags.get(i))
            .cloned()
            .unwrap_or_default()
    }

    fn write_band(&mut self, band: usize, data: ArrayView2<'_, f64>) -> Result<()> {
        let (bands, rows, cols) = self.pixels.dim();
        check_band_write(band, bands, &data, rows, cols)?;
        let raster_type = self.raster_type;
        self.pixels
            .index_axis_mut(Axis(0), band - 1)
            .zip_mut_with(&data, |dst, &src| *dst = raster_type.quantize(src));
        Ok(())
    }

    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result<()> {
        self.geo_transform = Some(geo_transform);
        self.gcps.clear();
        self.gcp_projection.clear();
        Ok(())
    }

    fn set_projection_ref(&mut self, projection: &str) -> Result<()> {
        self.projection_ref = projection.to_string();
        Ok(())
    }

    fn set_gcps(&mut self, gcps: &[Gcp], projection: &str) -> Result<()> {
        self.gcps = gcps.to_vec();
        self.gcp_projection = projection.to_string();
        self.geo_transform = None;
        Ok(())
    }

    fn set_global_tags(&mut self, tags: &Tags) -> Result<()> {
        self.tags = tags.clone();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn into_memory(self: Box<Self>) -> Option<MemDataset> {
        Some(*self)
    }
}

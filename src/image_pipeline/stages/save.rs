use std::path::{Path, PathBuf};

use ndarray::Axis;
use tracing::{info, instrument, warn};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::image::{Georeferencing, Image};
use crate::image_pipeline::raster::{driver_by_name, MemDriver, RasterDriver, RasterType};
use crate::image_pipeline::segment::{Segment, Value};

/// Configuration for [`SaveImage`]
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Short name of the raster driver to write with
    pub driver: String,
    /// Pass the input image downstream after saving
    pub return_image: bool,
    /// Write georeferencing (affine or GCPs, whichever is authoritative)
    pub save_projection: bool,
    /// Write the dataset-level tags
    pub save_metadata: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            driver: "GTiff".to_string(),
            return_image: true,
            save_projection: true,
            save_metadata: true,
        }
    }
}

impl SaveOptions {
    pub fn builder() -> SaveOptionsBuilder {
        SaveOptionsBuilder::default()
    }
}

/// Builder for SaveOptions
#[derive(Default)]
pub struct SaveOptionsBuilder {
    driver: Option<String>,
    return_image: Option<bool>,
    save_projection: Option<bool>,
    save_metadata: Option<bool>,
}

impl SaveOptionsBuilder {
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn return_image(mut self, enable: bool) -> Self {
        self.return_image = Some(enable);
        self
    }

    pub fn save_projection(mut self, enable: bool) -> Self {
        self.save_projection = Some(enable);
        self
    }

    pub fn save_metadata(mut self, enable: bool) -> Self {
        self.save_metadata = Some(enable);
        self
    }

    pub fn build(self) -> SaveOptions {
        let default = SaveOptions::default();
        SaveOptions {
            driver: self.driver.unwrap_or(default.driver),
            return_image: self.return_image.unwrap_or(default.return_image),
            save_projection: self.save_projection.unwrap_or(default.save_projection),
            save_metadata: self.save_metadata.unwrap_or(default.save_metadata),
        }
    }
}

/// Writes the incoming image to a raster dataset.
///
/// Output is the in-memory dataset when writing with the `MEM` driver,
/// otherwise the input image if `return_image` is set, otherwise nothing.
/// Band-level tags are not written.
pub struct SaveImage {
    path: PathBuf,
    options: SaveOptions,
    driver: Option<Box<dyn RasterDriver>>,
}

impl SaveImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, SaveOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: SaveOptions) -> Self {
        Self {
            path: path.into(),
            options,
            driver: None,
        }
    }

    /// Writes through `driver` instead of looking one up by name.
    pub fn with_driver<D: RasterDriver + 'static>(mut self, driver: D) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &SaveOptions {
        &self.options
    }

    #[instrument(skip(self, image), fields(path = %self.path.display(), image = %image.name))]
    pub fn save(&self, image: Image) -> Result<Value> {
        let resolved;
        let driver: &dyn RasterDriver = match &self.driver {
            Some(driver) => driver.as_ref(),
            None => {
                resolved = driver_by_name(&self.options.driver)?;
                resolved.as_ref()
            }
        };

        let raster_type = match RasterType::from_data_type(image.dtype) {
            Some(raster_type) => raster_type,
            None => {
                warn!(
                    "SaveImage found no native type for {}; saving as {}",
                    image.dtype,
                    RasterType::Float32
                );
                RasterType::Float32
            }
        };

        let mut dataset = {
            let _span = tracing::info_span!("create_dataset", driver = driver.name()).entered();
            driver.create(&self.path, image.cols(), image.rows(), image.band_count(), raster_type)?
        };

        {
            let _span = tracing::info_span!("write_bands", bands = image.band_count()).entered();
            for (index, band) in image.data.axis_iter(Axis(0)).enumerate() {
                dataset.write_band(index + 1, band)?;
            }
        }

        if self.options.save_projection {
            let metadata = &image.metadata;
            match metadata.authoritative_georeferencing() {
                Georeferencing::Affine => {
                    dataset.set_geo_transform(metadata.geotransform)?;
                    dataset.set_projection_ref(&metadata.projection_ref)?;
                }
                Georeferencing::Gcp => {
                    dataset.set_gcps(&metadata.gcps, &metadata.gcp_projection)?;
                }
            }
        }

        if self.options.save_metadata {
            dataset.set_global_tags(&image.metadata.meta)?;
        }

        dataset.flush()?;
        info!(raster_type = %raster_type, "Saved image");

        if driver.name().eq_ignore_ascii_case(MemDriver::NAME) {
            if let Some(memory) = dataset.into_memory() {
                return Ok(Value::Dataset(memory));
            }
        }
        if self.options.return_image {
            Ok(Value::Image(image))
        } else {
            Ok(Value::None)
        }
    }
}

impl Segment for SaveImage {
    fn transform(&self, input: Value) -> Result<Value> {
        self.save(input.into_image("SaveImage")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = SaveOptions::builder()
            .driver("MEM")
            .return_image(false)
            .save_metadata(false)
            .build();

        assert_eq!(options.driver, "MEM");
        assert!(!options.return_image);
        assert!(options.save_projection);
        assert!(!options.save_metadata);
    }

    #[test]
    fn test_default_options() {
        let options = SaveOptions::default();
        assert_eq!(options.driver, "GTiff");
        assert!(options.return_image && options.save_projection && options.save_metadata);
    }
}

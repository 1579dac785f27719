//! Source stages that put an image at the head of a pipeline.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::{Image, Metadata};
use crate::image_pipeline::raster::{GeoTiffDriver, RasterDriver};
use crate::image_pipeline::segment::{Segment, Value};

/// Reads a whole dataset into an [`Image`].
///
/// The dataset handle is released before the image is returned. Single-band
/// datasets gain a leading band axis of length one.
#[instrument(skip(driver, name), fields(driver = driver.name()))]
fn load_from_disk(driver: &dyn RasterDriver, path: &Path, name: Option<&str>, verbose: bool) -> Result<Image> {
    let dataset = driver
        .open(path)?
        .ok_or_else(|| PipelineError::NotFound(path.to_path_buf()))?;

    let data = dataset.read_all()?;
    let dtype = dataset.data_type();
    let metadata = Metadata {
        geotransform: dataset.geo_transform().unwrap_or_default(),
        projection_ref: dataset.projection_ref(),
        gcps: dataset.gcps(),
        gcp_projection: dataset.gcp_projection(),
        meta: dataset.global_tags(),
        band_meta: (1..=dataset.raster_count()).map(|band| dataset.band_tags(band)).collect(),
    };
    drop(dataset);

    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let image = Image::from_dyn(name, data, dtype, metadata)?;

    info!(
        name = %image.name,
        bands = image.band_count(),
        rows = image.rows(),
        cols = image.cols(),
        "Loaded image"
    );
    if verbose {
        println!("{}", image);
    }
    Ok(image)
}

/// Hands back an already loaded image, renamed if asked.
fn load_from_memory(image: &Image, name: Option<&str>, verbose: bool) -> Image {
    let mut image = image.clone();
    if let Some(name) = name {
        image.name = name.to_string();
    }
    if verbose {
        println!("{}", image);
    }
    image
}

fn discard_input(stage: &'static str, input: &Value) {
    if !input.is_none() {
        debug!("{} is a source stage; discarding {} input", stage, input.kind());
    }
}

/// Loads an image file through a raster driver (GeoTIFF unless told otherwise).
pub struct LoadImageFromDisk {
    path: PathBuf,
    name: Option<String>,
    verbose: bool,
    driver: Box<dyn RasterDriver>,
}

impl LoadImageFromDisk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            verbose: false,
            driver: Box::new(GeoTiffDriver),
        }
    }

    /// Overrides the name otherwise taken from the file stem.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_driver<D: RasterDriver + 'static>(mut self, driver: D) -> Self {
        self.driver = Box::new(driver);
        self
    }

    pub fn load(&self) -> Result<Image> {
        load_from_disk(self.driver.as_ref(), &self.path, self.name.as_deref(), self.verbose)
    }
}

impl Segment for LoadImageFromDisk {
    fn transform(&self, input: Value) -> Result<Value> {
        discard_input("LoadImageFromDisk", &input);
        self.load().map(Value::Image)
    }
}

/// Feeds an in-memory image into a pipeline.
///
/// Each run returns the same image: the pixel buffer and metadata are shared,
/// not copied.
pub struct LoadImageFromMemory {
    image: Image,
    name: Option<String>,
    verbose: bool,
}

impl LoadImageFromMemory {
    pub fn new(image: Image) -> Self {
        Self {
            image,
            name: None,
            verbose: false,
        }
    }

    /// Accepts only [`Value::Image`].
    pub fn try_from_value(value: Value) -> Result<Self> {
        value.into_image("LoadImageFromMemory").map(Self::new)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn load(&self) -> Image {
        load_from_memory(&self.image, self.name.as_deref(), self.verbose)
    }
}

impl Segment for LoadImageFromMemory {
    fn transform(&self, input: Value) -> Result<Value> {
        discard_input("LoadImageFromMemory", &input);
        Ok(Value::Image(self.load()))
    }
}

/// Where [`LoadImage`] gets its image from, decided when the stage is built.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Memory(Image),
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<String> for ImageSource {
    fn from(path: String) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Image> for ImageSource {
    fn from(image: Image) -> Self {
        ImageSource::Memory(image)
    }
}

impl TryFrom<Value> for ImageSource {
    type Error = PipelineError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Text(path) => Ok(ImageSource::Path(PathBuf::from(path))),
            Value::Image(image) => Ok(ImageSource::Memory(image)),
            other => Err(PipelineError::InvalidInput {
                stage: "LoadImage",
                expected: "path or image",
                found: other.kind(),
            }),
        }
    }
}

/// Loads from a path or passes through an in-memory image.
pub struct LoadImage {
    source: ImageSource,
    name: Option<String>,
    verbose: bool,
    driver: Box<dyn RasterDriver>,
}

impl LoadImage {
    pub fn new(source: impl Into<ImageSource>) -> Self {
        Self {
            source: source.into(),
            name: None,
            verbose: false,
            driver: Box::new(GeoTiffDriver),
        }
    }

    /// Builds from a pipeline value; only text and images are accepted.
    pub fn try_new(value: Value) -> Result<Self> {
        ImageSource::try_from(value).map(Self::new)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Driver used when the source is a path.
    pub fn with_driver<D: RasterDriver + 'static>(mut self, driver: D) -> Self {
        self.driver = Box::new(driver);
        self
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn load(&self) -> Result<Image> {
        match &self.source {
            ImageSource::Path(path) => {
                load_from_disk(self.driver.as_ref(), path, self.name.as_deref(), self.verbose)
            }
            ImageSource::Memory(image) => Ok(load_from_memory(image, self.name.as_deref(), self.verbose)),
        }
    }
}

impl Segment for LoadImage {
    fn transform(&self, input: Value) -> Result<Value> {
        discard_input("LoadImage", &input);
        self.load().map(Value::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::image::DataType;
    use ndarray::Array3;

    fn sample() -> Image {
        Image::new("sample", Array3::<f64>::ones((2, 3, 4)).into_shared(), DataType::UInt8, Metadata::default())
    }

    #[test]
    fn test_memory_load_shares_buffers() {
        let image = sample();
        let loaded = LoadImageFromMemory::new(image.clone()).load();
        assert_eq!(loaded, image);
        assert!(loaded.shares_metadata_with(&image));
        assert_eq!(loaded.data.as_ptr(), image.data.as_ptr());
    }

    #[test]
    fn test_memory_load_renames() {
        let loaded = LoadImageFromMemory::new(sample()).name("renamed").load();
        assert_eq!(loaded.name, "renamed");
    }

    #[test]
    fn test_memory_load_rejects_non_image() {
        let result = LoadImageFromMemory::try_from_value(Value::from("a.tif"));
        assert!(matches!(
            result,
            Err(PipelineError::InvalidInput { stage: "LoadImageFromMemory", .. })
        ));
    }

    #[test]
    fn test_source_dispatch() {
        assert!(matches!(ImageSource::from("scene.tif"), ImageSource::Path(_)));
        assert!(matches!(ImageSource::from(sample()), ImageSource::Memory(_)));
        assert!(matches!(ImageSource::try_from(Value::from("x.tif")), Ok(ImageSource::Path(_))));
        assert!(matches!(
            ImageSource::try_from(Value::None),
            Err(PipelineError::InvalidInput { stage: "LoadImage", found: "none", .. })
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.tif");
        let result = LoadImage::new(path.as_path()).load();
        assert!(matches!(result, Err(PipelineError::NotFound(p)) if p == path));
    }
}

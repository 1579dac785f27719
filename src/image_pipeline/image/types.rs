//! The in-memory raster image

use std::fmt;
use std::sync::Arc;

use ndarray::{ArcArray, ArrayD, Axis, Ix3};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::{DataType, Metadata};

/// Pixel cube with axes (band, row, column).
pub type Bands = ArcArray<f64, Ix3>;

/// Metadata strings longer than this are truncated in summaries.
const MAX_SUMMARY_METADATA: usize = 400;
/// Characters kept from an over-long metadata string.
const TRUNCATED_METADATA: usize = 360;

/// Multi-band raster flowing through a pipeline.
///
/// Cloning is cheap: the pixel buffer and the metadata are both shared
/// until one side writes to them.
#[derive(Debug, Clone)]
pub struct Image {
    /// Display label
    pub name: String,
    /// Pixel values, (band, row, column)
    pub data: Bands,
    /// Element type of the pixels at the source
    pub dtype: DataType,
    /// Georeferencing and tags, shared with images derived from this one
    pub metadata: Arc<Metadata>,
}

impl Image {
    pub fn new(name: impl Into<String>, data: Bands, dtype: DataType, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            data,
            dtype,
            metadata: Arc::new(metadata),
        }
    }

    /// Builds an image from an array of any rank.
    ///
    /// A 2-D array is a single band and gains a leading band axis of length
    /// one. Anything other than rank 2 or 3 is rejected.
    pub fn from_dyn(name: impl Into<String>, data: ArrayD<f64>, dtype: DataType, metadata: Metadata) -> Result<Self> {
        let ndim = data.ndim();
        let data = match ndim {
            2 => data.insert_axis(Axis(0)),
            3 => data,
            _ => return Err(PipelineError::Dimension(ndim)),
        };
        let data = data.into_dimensionality::<Ix3>()?;
        Ok(Self::new(name, data.into_shared(), dtype, metadata))
    }

    /// Creates a new image that takes this image's name and metadata by
    /// reference and replaces the pixels.
    pub fn derive(&self, data: Bands, dtype: DataType) -> Self {
        Self {
            name: self.name.clone(),
            data,
            dtype,
            metadata: Arc::clone(&self.metadata),
        }
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Mutable metadata access. Detaches from any image sharing it first.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        Arc::make_mut(&mut self.metadata)
    }

    pub fn shares_metadata_with(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.metadata, &other.metadata)
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dtype == other.dtype
            && self.data == other.data
            && self.metadata == other.metadata
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut metastring = self.metadata.to_string();
        if metastring.chars().count() > MAX_SUMMARY_METADATA {
            metastring = metastring.chars().take(TRUNCATED_METADATA).collect();
            metastring.push_str("...");
        }
        write!(
            f,
            "{}: {} bands, {}x{}, {}, {}",
            self.name,
            self.band_count(),
            self.rows(),
            self.cols(),
            self.dtype,
            metastring
        )
    }
}

//! Band stacking

use ndarray::{ArrayView3, Axis};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::DataType;
use crate::image_pipeline::segment::{Segment, Value};

/// Stacks a tuple of images along the band axis.
///
/// The result takes its name and metadata from the image at `master`,
/// sharing the metadata rather than copying it. Dtype stays as is when
/// every input agrees and becomes `float64` otherwise.
#[derive(Debug, Clone, Default)]
pub struct MergeToStack {
    master: usize,
}

impl MergeToStack {
    pub fn new(master: usize) -> Self {
        Self { master }
    }

    pub fn master(&self) -> usize {
        self.master
    }
}

impl Segment for MergeToStack {
    fn transform(&self, input: Value) -> Result<Value> {
        let images = input.into_images("MergeToStack")?;
        let master = images
            .get(self.master)
            .ok_or(PipelineError::ItemIndexOutOfRange {
                index: self.master,
                len: images.len(),
            })?;

        let views: Vec<ArrayView3<'_, f64>> = images.iter().map(|image| image.data.view()).collect();
        let stacked = ndarray::concatenate(Axis(0), &views)?;
        let dtype = images
            .iter()
            .map(|image| image.dtype)
            .reduce(DataType::promote)
            .unwrap_or_default();

        debug!(
            inputs = images.len(),
            bands = stacked.len_of(Axis(0)),
            master = %master.name,
            "Stacked images"
        );
        Ok(Value::Image(master.derive(stacked.into_shared(), dtype)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::image::{GeoTransform, Image, Metadata};
    use ndarray::{Array3, array};

    fn image(name: &str, fill: f64, bands: usize, dtype: DataType) -> Image {
        let metadata = Metadata::default().with_geotransform(GeoTransform::new(fill, 0.0, 1.0, -1.0), "EPSG:4326");
        Image::new(name, Array3::from_elem((bands, 2, 3), fill).into_shared(), dtype, metadata)
    }

    #[test]
    fn test_stacks_in_order() {
        let a = image("a", 1.0, 1, DataType::UInt8);
        let b = image("b", 2.0, 2, DataType::UInt8);
        let out = MergeToStack::default()
            .transform(Value::from(vec![a.clone(), b]))
            .unwrap()
            .into_image("test")
            .unwrap();

        assert_eq!(out.band_count(), 3);
        assert_eq!(out.data[[0, 0, 0]], 1.0);
        assert_eq!(out.data[[2, 1, 2]], 2.0);
        assert_eq!(out.dtype, DataType::UInt8);
        assert_eq!(out.name, "a");
        assert!(out.shares_metadata_with(&a));
    }

    #[test]
    fn test_master_selects_metadata() {
        let a = image("a", 1.0, 1, DataType::UInt8);
        let b = image("b", 2.0, 1, DataType::Float32);
        let out = MergeToStack::new(1)
            .transform(Value::from(vec![a, b.clone()]))
            .unwrap()
            .into_image("test")
            .unwrap();
        assert_eq!(out.name, "b");
        assert!(out.shares_metadata_with(&b));
        assert_eq!(out.dtype, DataType::Float64);
    }

    #[test]
    fn test_mismatched_shapes() {
        let a = image("a", 1.0, 1, DataType::UInt8);
        let b = Image::new("b", array![[[1.0]]].into_shared(), DataType::UInt8, Metadata::default());
        let err = MergeToStack::default().transform(Value::from(vec![a, b])).unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
    }

    #[test]
    fn test_master_out_of_range() {
        let a = image("a", 1.0, 1, DataType::UInt8);
        let err = MergeToStack::new(3).transform(Value::from(vec![a])).unwrap_err();
        assert!(matches!(err, PipelineError::ItemIndexOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn test_rejects_non_tuple() {
        let a = image("a", 1.0, 1, DataType::UInt8);
        let err = MergeToStack::default().transform(Value::Image(a)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }
}

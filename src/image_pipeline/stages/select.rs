//! Item and band selection

use ndarray::Axis;
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::segment::{Segment, Value};

/// Picks one element out of a tuple value.
#[derive(Debug, Clone, Default)]
pub struct SelectItem {
    index: usize,
}

impl SelectItem {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Segment for SelectItem {
    fn transform(&self, input: Value) -> Result<Value> {
        let mut items = input.into_tuple("SelectItem")?;
        if self.index >= items.len() {
            return Err(PipelineError::ItemIndexOutOfRange {
                index: self.index,
                len: items.len(),
            });
        }
        Ok(items.swap_remove(self.index))
    }
}

/// Zero-based band indices; order is kept and repeats are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandList(Vec<usize>);

impl BandList {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<usize> for BandList {
    fn from(band: usize) -> Self {
        Self(vec![band])
    }
}

impl From<Vec<usize>> for BandList {
    fn from(bands: Vec<usize>) -> Self {
        Self(bands)
    }
}

impl From<&[usize]> for BandList {
    fn from(bands: &[usize]) -> Self {
        Self(bands.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for BandList {
    fn from(bands: [usize; N]) -> Self {
        Self(bands.to_vec())
    }
}

/// Keeps the listed bands, in list order.
#[derive(Debug, Clone)]
pub struct SelectBands {
    bands: BandList,
}

impl SelectBands {
    pub fn new(bands: impl Into<BandList>) -> Self {
        Self { bands: bands.into() }
    }

    pub fn bands(&self) -> &[usize] {
        self.bands.indices()
    }
}

impl Segment for SelectBands {
    fn transform(&self, input: Value) -> Result<Value> {
        let image = input.into_image("SelectBands")?;
        let count = image.band_count();
        if let Some(&index) = self.bands.indices().iter().find(|&&b| b >= count) {
            return Err(PipelineError::BandIndexOutOfRange { index, bands: count });
        }

        let data = image.data.select(Axis(0), self.bands.indices());
        debug!(image = %image.name, bands = ?self.bands.indices(), "Selected bands");
        Ok(Value::Image(image.derive(data.into_shared(), image.dtype)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::image::{DataType, Image, Metadata};
    use ndarray::array;

    fn rgb() -> Image {
        Image::new(
            "rgb",
            array![[[1.0, 1.5]], [[2.0, 2.5]], [[3.0, 3.5]]].into_shared(),
            DataType::UInt8,
            Metadata::default(),
        )
    }

    fn select(bands: impl Into<BandList>, image: &Image) -> Result<Image> {
        SelectBands::new(bands)
            .transform(Value::Image(image.clone()))?
            .into_image("test")
    }

    #[test]
    fn test_select_item() {
        let tuple = Value::Tuple(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert_eq!(SelectItem::new(1).transform(tuple.clone()).unwrap(), Value::from("b"));
        assert_eq!(SelectItem::default().transform(tuple.clone()).unwrap(), Value::from("a"));
        assert!(matches!(
            SelectItem::new(3).transform(tuple),
            Err(PipelineError::ItemIndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_select_item_needs_tuple() {
        let err = SelectItem::new(0).transform(Value::Image(rgb())).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { stage: "SelectItem", .. }));
    }

    #[test]
    fn test_identity_selection() {
        let image = rgb();
        let out = select([0, 1, 2], &image).unwrap();
        assert_eq!(out, image);
        assert!(out.shares_metadata_with(&image));
    }

    #[test]
    fn test_reorder_and_repeat() {
        let image = rgb();
        let reversed = select(vec![2, 1, 0], &image).unwrap();
        assert_eq!(reversed.data[[0, 0, 0]], 3.0);
        assert_eq!(reversed.data[[2, 0, 1]], 1.5);

        let twice = select([0, 0], &image).unwrap();
        assert_eq!(twice.band_count(), 2);
        assert_eq!(twice.data.index_axis(Axis(0), 0), twice.data.index_axis(Axis(0), 1));
    }

    #[test]
    fn test_single_band_keeps_rank() {
        let out = select(1, &rgb()).unwrap();
        assert_eq!(out.data.shape(), &[1, 1, 2]);
    }

    #[test]
    fn test_band_out_of_range() {
        let err = select([0, 3], &rgb()).unwrap_err();
        assert!(matches!(err, PipelineError::BandIndexOutOfRange { index: 3, bands: 3 }));
    }
}

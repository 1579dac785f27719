//! Georeferenced extent

use std::fmt;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::segment::{Segment, Value};

/// Axis-aligned extent in georeferenced coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Envelope {
    /// `[xmin, ymin, xmax, ymax]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// Computes an image's extent from its geotransform.
///
/// Rotation terms are ignored, and "min"/"max" follow the sign of the
/// pixel size rather than being sorted. Images loaded without a
/// geotransform carry the identity transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bounds;

impl Segment for Bounds {
    fn transform(&self, input: Value) -> Result<Value> {
        let image = input.into_image("Bounds")?;
        let gt = image.metadata.geotransform;
        let envelope = Envelope {
            xmin: gt.origin_x,
            ymin: gt.origin_y + gt.pixel_height * image.rows() as f64,
            xmax: gt.origin_x + gt.pixel_width * image.cols() as f64,
            ymax: gt.origin_y,
        };
        Ok(Value::Bounds(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::image::{DataType, GeoTransform, Image, Metadata};
    use ndarray::Array3;

    fn image(metadata: Metadata) -> Image {
        Image::new("grid", Array3::zeros((1, 10, 5)).into_shared(), DataType::Float32, metadata)
    }

    #[test]
    fn test_north_up_extent() {
        let gt = GeoTransform::from_coefficients([100.0, 2.0, 0.0, 200.0, 0.0, -2.0]);
        let out = Bounds.transform(Value::Image(image(Metadata::default().with_geotransform(gt, "EPSG:32633")))).unwrap();
        let Value::Bounds(envelope) = out else {
            panic!("expected bounds, got {}", out.kind());
        };
        assert_eq!(envelope.to_array(), [100.0, 180.0, 110.0, 200.0]);
    }

    #[test]
    fn test_missing_geotransform_uses_identity() {
        let out = Bounds.transform(Value::Image(image(Metadata::default()))).unwrap();
        assert_eq!(
            out,
            Value::Bounds(Envelope { xmin: 0.0, ymin: 10.0, xmax: 5.0, ymax: 0.0 })
        );
    }
}

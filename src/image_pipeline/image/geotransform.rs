//! Affine geotransform

use std::fmt;

/// Affine transformation coefficients for georeferencing rasters.
///
/// Maps pixel coordinates (col, row) to world coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Row rotation (usually 0)
    pub row_rotation: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Column rotation (usually 0)
    pub col_rotation: f64,
    /// Pixel height (cell size in Y direction, negative for north-up)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a north-up transform with no rotation.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    /// Create from the six-coefficient form
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub fn from_coefficients(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    pub fn to_coefficients(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    pub fn has_rotation(&self) -> bool {
        self.row_rotation != 0.0 || self.col_rotation != 0.0
    }
}

/// The transform reported for datasets that carry no affine georeferencing.
impl Default for GeoTransform {
    fn default() -> Self {
        Self::from_coefficients([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.to_coefficients();
        write!(f, "({}, {}, {}, {}, {}, {})", c[0], c[1], c[2], c[3], c[4], c[5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient_order() {
        let gt = GeoTransform::from_coefficients([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        assert_eq!(gt.origin_x, 100.0);
        assert_eq!(gt.row_rotation, 0.5);
        assert_eq!(gt.col_rotation, 0.25);
        assert_eq!(gt.to_coefficients(), [100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        assert!(gt.has_rotation());
    }
}

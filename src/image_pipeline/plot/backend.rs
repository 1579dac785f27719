use ndarray::ArrayViewD;

use crate::image_pipeline::common::error::Result;

pub trait PlotBackend {
    /// Draws a (row, col) or (row, col, channel) array.
    fn render(&self, pixels: ArrayViewD<'_, f64>, cmap: &str, vmin: Option<f64>, vmax: Option<f64>) -> Result<()>;
    /// Presents everything rendered since the last call.
    fn show(&self) -> Result<()>;
}

//! Plot rendering module
//!
//! [`ShowImage`](crate::image_pipeline::stages::ShowImage) hands pixel arrays
//! to a [`PlotBackend`]. The built-in backend writes each figure to a PNG.

mod backend;
mod png_plotter;

pub use backend::PlotBackend;
pub use png_plotter::PngPlotter;

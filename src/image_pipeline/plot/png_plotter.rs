use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::{ArrayViewD, Ix2, Ix3};
use tracing::{info, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::plot::PlotBackend;

/// Plot backend that saves every shown figure as `<dir>/<prefix>_<n>.png`.
///
/// Single-channel arrays are mapped through a grey colormap between `vmin`
/// and `vmax` (the data range when unset). Three- and four-channel arrays are
/// written as RGB / RGBA; values up to 1.0 are treated as fractions, larger
/// ones as 0-255 intensities.
#[derive(Debug)]
pub struct PngPlotter {
    dir: PathBuf,
    prefix: String,
    shown: Cell<usize>,
    pending: RefCell<Option<DynamicImage>>,
}

impl PngPlotter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "figure".to_string(),
            shown: Cell::new(0),
            pending: RefCell::new(None),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of figures written so far.
    pub fn shown(&self) -> usize {
        self.shown.get()
    }
}

impl Default for PngPlotter {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("georaster_pipeline"))
    }
}

fn finite_range(pixels: &ArrayViewD<'_, f64>) -> (f64, f64) {
    pixels
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn unit_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

fn render_gray(pixels: &ArrayViewD<'_, f64>, cmap: &str, vmin: Option<f64>, vmax: Option<f64>) -> Result<DynamicImage> {
    let view = pixels.view().into_dimensionality::<Ix2>()?;
    let (rows, cols) = view.dim();

    let (data_lo, data_hi) = finite_range(pixels);
    let lo = vmin.unwrap_or(data_lo);
    let hi = vmax.unwrap_or(data_hi);
    let span = hi - lo;

    let reversed = match cmap {
        "gray" | "grey" | "Greys_r" => false,
        "gray_r" | "grey_r" | "Greys" => true,
        other => {
            warn!("Unsupported colormap '{}'; using gray", other);
            false
        }
    };

    let image = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = view[[y as usize, x as usize]];
        let t = if span > 0.0 { (value - lo) / span } else { 0.0 };
        let t = if reversed { 1.0 - t } else { t };
        Luma([unit_to_byte(t)])
    });
    Ok(DynamicImage::ImageLuma8(image))
}

fn render_color(pixels: &ArrayViewD<'_, f64>) -> Result<DynamicImage> {
    let view = pixels.view().into_dimensionality::<Ix3>()?;
    let (rows, cols, channels) = view.dim();

    let (_, data_hi) = finite_range(pixels);
    let scale = if data_hi <= 1.0 { 1.0 } else { 255.0 };
    let sample = |y: u32, x: u32, c: usize| unit_to_byte(view[[y as usize, x as usize, c]] / scale);

    match channels {
        3 => Ok(DynamicImage::ImageRgb8(RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
            Rgb([sample(y, x, 0), sample(y, x, 1), sample(y, x, 2)])
        }))),
        4 => Ok(DynamicImage::ImageRgba8(RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
            Rgba([sample(y, x, 0), sample(y, x, 1), sample(y, x, 2), sample(y, x, 3)])
        }))),
        n => Err(PipelineError::Render(format!(
            "cannot display {} channels; select 1, 3 or 4 bands first",
            n
        ))),
    }
}

impl PlotBackend for PngPlotter {
    fn render(&self, pixels: ArrayViewD<'_, f64>, cmap: &str, vmin: Option<f64>, vmax: Option<f64>) -> Result<()> {
        let figure = match pixels.ndim() {
            2 => render_gray(&pixels, cmap, vmin, vmax)?,
            3 => render_color(&pixels)?,
            n => {
                return Err(PipelineError::Render(format!(
                    "expected a 2-D or 3-D array, got {} dimensions (shape {:?})",
                    n,
                    pixels.shape()
                )))
            }
        };
        *self.pending.borrow_mut() = Some(figure);
        Ok(())
    }

    fn show(&self) -> Result<()> {
        let figure = self
            .pending
            .borrow_mut()
            .take()
            .ok_or_else(|| PipelineError::Render("nothing rendered to show".into()))?;

        std::fs::create_dir_all(&self.dir)?;
        let index = self.shown.get();
        let path = self.dir.join(format!("{}_{}.png", self.prefix, index));
        figure
            .save(&path)
            .map_err(|e| PipelineError::Render(format!("{}: {}", path.display(), e)))?;
        self.shown.set(index + 1);

        info!(path = %path.display(), "Wrote figure");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_gray_figure_written() {
        let dir = tempfile::tempdir().unwrap();
        let plotter = PngPlotter::new(dir.path()).prefix("dem");
        let pixels = array![[0.0, 1.0], [2.0, f64::NAN]].into_dyn();

        plotter.render(pixels.view(), "gray", None, None).unwrap();
        plotter.show().unwrap();

        let written = image::open(dir.path().join("dem_0.png")).unwrap().to_luma8();
        assert_eq!(written.get_pixel(0, 0)[0], 0);
        assert_eq!(written.get_pixel(0, 1)[0], 255);
        assert_eq!(plotter.shown(), 1);
    }

    #[test]
    fn test_show_without_render_fails() {
        let dir = tempfile::tempdir().unwrap();
        let plotter = PngPlotter::new(dir.path());
        assert!(matches!(plotter.show(), Err(PipelineError::Render(_))));
    }

    #[test]
    fn test_two_channel_rejected() {
        let plotter = PngPlotter::new("unused");
        let pixels = Array3::<f64>::zeros((2, 2, 2)).into_dyn();
        assert!(matches!(
            plotter.render(pixels.view(), "gray", None, None),
            Err(PipelineError::Render(_))
        ));
    }
}

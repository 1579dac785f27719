use ndarray::{ArrayD, Axis};
use tracing::debug;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::image::Image;
use crate::image_pipeline::plot::{PlotBackend, PngPlotter};
use crate::image_pipeline::segment::{Segment, Value};

/// Configuration for [`ShowImage`]
#[derive(Debug, Clone)]
pub struct ShowOptions {
    /// Print the image summary
    pub show_text: bool,
    /// Render the pixels
    pub show_image: bool,
    pub cmap: String,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            show_text: false,
            show_image: true,
            cmap: "gray".to_string(),
            vmin: None,
            vmax: None,
        }
    }
}

impl ShowOptions {
    pub fn builder() -> ShowOptionsBuilder {
        ShowOptionsBuilder::default()
    }
}

/// Builder for ShowOptions
#[derive(Default)]
pub struct ShowOptionsBuilder {
    show_text: Option<bool>,
    show_image: Option<bool>,
    cmap: Option<String>,
    vmin: Option<f64>,
    vmax: Option<f64>,
}

impl ShowOptionsBuilder {
    pub fn show_text(mut self, enable: bool) -> Self {
        self.show_text = Some(enable);
        self
    }

    pub fn show_image(mut self, enable: bool) -> Self {
        self.show_image = Some(enable);
        self
    }

    pub fn cmap(mut self, cmap: impl Into<String>) -> Self {
        self.cmap = Some(cmap.into());
        self
    }

    pub fn vmin(mut self, vmin: f64) -> Self {
        self.vmin = Some(vmin);
        self
    }

    pub fn vmax(mut self, vmax: f64) -> Self {
        self.vmax = Some(vmax);
        self
    }

    pub fn build(self) -> ShowOptions {
        let default = ShowOptions::default();
        ShowOptions {
            show_text: self.show_text.unwrap_or(default.show_text),
            show_image: self.show_image.unwrap_or(default.show_image),
            cmap: self.cmap.unwrap_or(default.cmap),
            vmin: self.vmin.or(default.vmin),
            vmax: self.vmax.or(default.vmax),
        }
    }
}

/// Band-first pixels as (row, col, band) with every length-one axis removed.
pub(crate) fn display_array(image: &Image) -> ArrayD<f64> {
    let mut pixels = image.data.view().permuted_axes([1, 2, 0]).to_owned().into_dyn();
    let mut axis = 0;
    while axis < pixels.ndim() {
        if pixels.len_of(Axis(axis)) == 1 {
            pixels = pixels.index_axis_move(Axis(axis), 0);
        } else {
            axis += 1;
        }
    }
    pixels
}

/// Displays the incoming image and passes it on unchanged.
pub struct ShowImage {
    options: ShowOptions,
    backend: Box<dyn PlotBackend>,
}

impl ShowImage {
    pub fn new() -> Self {
        Self::with_options(ShowOptions::default())
    }

    pub fn with_options(options: ShowOptions) -> Self {
        Self {
            options,
            backend: Box::new(PngPlotter::default()),
        }
    }

    pub fn with_backend<B: PlotBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn options(&self) -> &ShowOptions {
        &self.options
    }

    fn show(&self, image: &Image) -> Result<()> {
        if self.options.show_text {
            println!("{}", image);
        }
        if !self.options.show_image {
            return Ok(());
        }

        let mut pixels = display_array(image);
        let (vmin, vmax) = (self.options.vmin, self.options.vmax);
        if let (Some(lo), Some(hi)) = (vmin, vmax) {
            // Multi-band figures are rescaled here; the backend only scales single-band ones.
            if pixels.ndim() == 3 {
                pixels.mapv_inplace(|v| ((v - lo) / (hi - lo)).clamp(0.0, 1.0));
            }
        }
        debug!(shape = ?pixels.shape(), cmap = %self.options.cmap, "Rendering image");
        self.backend.render(pixels.view(), &self.options.cmap, vmin, vmax)?;
        self.backend.show()
    }
}

impl Default for ShowImage {
    fn default() -> Self {
        Self::new()
    }
}

impl Segment for ShowImage {
    fn transform(&self, input: Value) -> Result<Value> {
        let image = input.into_image("ShowImage")?;
        self.show(&image)?;
        Ok(Value::Image(image))
    }
}

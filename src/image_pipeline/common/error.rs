use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Image file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid input in {stage}: expected {expected}, got {found}")]
    InvalidInput {
        stage: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Band index {index} out of range for image with {bands} bands")]
    BandIndexOutOfRange { index: usize, bands: usize },

    #[error("Item index {index} out of range for sequence of length {len}")]
    ItemIndexOutOfRange { index: usize, len: usize },

    #[error("Image data has an unsupported number of dimensions: {0}")]
    Dimension(usize),

    #[error("Unknown raster driver: {0}")]
    UnknownDriver(String),

    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Failed to encode raster: {0}")]
    Encode(String),

    #[error("Failed to render image: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

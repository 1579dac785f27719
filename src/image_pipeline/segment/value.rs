//! Values flowing between segments

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::Image;
use crate::image_pipeline::raster::MemDataset;
use crate::image_pipeline::stages::{Envelope, StatsTable};

/// Output of one segment and input of the next.
///
/// Stages that emit several results at once (statistics, branch merges)
/// return a [`Value::Tuple`]; `SelectItem` picks one element back out.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (input of a source stage, or a stage told to return nothing)
    None,
    /// A path or other plain string
    Text(String),
    Image(Image),
    Tuple(Vec<Value>),
    Table(StatsTable),
    Bounds(Envelope),
    /// Dataset produced by saving through the in-memory driver
    Dataset(MemDataset),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Text(_) => "text",
            Value::Image(_) => "image",
            Value::Tuple(_) => "tuple",
            Value::Table(_) => "table",
            Value::Bounds(_) => "bounds",
            Value::Dataset(_) => "dataset",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn into_image(self, stage: &'static str) -> Result<Image> {
        match self {
            Value::Image(image) => Ok(image),
            other => Err(PipelineError::InvalidInput {
                stage,
                expected: "image",
                found: other.kind(),
            }),
        }
    }

    /// Unpacks a tuple whose every element is an image.
    pub fn into_images(self, stage: &'static str) -> Result<Vec<Image>> {
        self.into_tuple(stage)?
            .into_iter()
            .map(|item| match item {
                Value::Image(image) => Ok(image),
                other => Err(PipelineError::InvalidInput {
                    stage,
                    expected: "sequence of images",
                    found: other.kind(),
                }),
            })
            .collect()
    }

    pub fn into_tuple(self, stage: &'static str) -> Result<Vec<Value>> {
        match self {
            Value::Tuple(items) => Ok(items),
            other => Err(PipelineError::InvalidInput {
                stage,
                expected: "tuple",
                found: other.kind(),
            }),
        }
    }
}

impl From<Image> for Value {
    fn from(image: Image) -> Self {
        Value::Image(image)
    }
}

impl From<Vec<Image>> for Value {
    fn from(images: Vec<Image>) -> Self {
        Value::Tuple(images.into_iter().map(Value::Image).collect())
    }
}

impl From<StatsTable> for Value {
    fn from(table: StatsTable) -> Self {
        Value::Table(table)
    }
}

impl From<Envelope> for Value {
    fn from(bounds: Envelope) -> Self {
        Value::Bounds(bounds)
    }
}

impl From<MemDataset> for Value {
    fn from(dataset: MemDataset) -> Self {
        Value::Dataset(dataset)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

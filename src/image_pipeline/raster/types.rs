//! Native raster type codes

use std::fmt;

use crate::image_pipeline::image::DataType;

/// Sample type a dataset stores on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterType {
    Byte,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl RasterType {
    /// Native type matching an in-memory element type, if there is one.
    pub fn from_data_type(data_type: DataType) -> Option<RasterType> {
        match data_type {
            DataType::UInt8 => Some(RasterType::Byte),
            DataType::Int8 => Some(RasterType::Int8),
            DataType::UInt16 => Some(RasterType::UInt16),
            DataType::Int16 => Some(RasterType::Int16),
            DataType::UInt32 => Some(RasterType::UInt32),
            DataType::Int32 => Some(RasterType::Int32),
            DataType::Float32 => Some(RasterType::Float32),
            DataType::Float64 => Some(RasterType::Float64),
            DataType::Bool | DataType::UInt64 | DataType::Int64 => None,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            RasterType::Byte => DataType::UInt8,
            RasterType::Int8 => DataType::Int8,
            RasterType::UInt16 => DataType::UInt16,
            RasterType::Int16 => DataType::Int16,
            RasterType::UInt32 => DataType::UInt32,
            RasterType::Int32 => DataType::Int32,
            RasterType::Float32 => DataType::Float32,
            RasterType::Float64 => DataType::Float64,
        }
    }

    /// Rounds a value through this storage type (saturating for integers).
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            RasterType::Byte => value as u8 as f64,
            RasterType::Int8 => value as i8 as f64,
            RasterType::UInt16 => value as u16 as f64,
            RasterType::Int16 => value as i16 as f64,
            RasterType::UInt32 => value as u32 as f64,
            RasterType::Int32 => value as i32 as f64,
            RasterType::Float32 => value as f32 as f64,
            RasterType::Float64 => value,
        }
    }
}

impl fmt::Display for RasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

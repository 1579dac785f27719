use std::fmt;

/// Element type of the pixels as they were stored at the source.
///
/// Pixel values are always held as `f64` in memory; the data type records
/// what the values originally were so a save can pick a matching native type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    #[default]
    Float64,
}

impl DataType {
    /// Common type of two inputs when their bands are stacked together.
    ///
    /// Equal types are kept; anything else widens to `Float64`.
    pub fn promote(self, other: DataType) -> DataType {
        if self == other {
            self
        } else {
            DataType::Float64
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

//! Pipeline stages
//!
//! Loaders are sources; everything else transforms the value handed to it
//! by the previous stage.

mod bounds;
mod load;
mod merge;
mod save;
mod select;
mod show;
mod stats;

pub use bounds::{Bounds, Envelope};
pub use load::{ImageSource, LoadImage, LoadImageFromDisk, LoadImageFromMemory};
pub use merge::MergeToStack;
pub use save::{SaveImage, SaveOptions, SaveOptionsBuilder};
pub use select::{BandList, SelectBands, SelectItem};
pub use show::{ShowImage, ShowOptions, ShowOptionsBuilder};
pub use stats::{BandStats, Column, ColumnValues, ImageStats, StatsOptions, StatsOptionsBuilder, StatsTable};

//! Pipeline composition
//!
//! Every stage implements [`Segment`]. Stages chain with [`compose`] (or
//! [`SegmentExt::then`]) and fan out with [`Merge`]; the result of either is
//! itself a segment, so pipelines nest freely.

mod compose;
mod value;

pub use compose::{compose, Chain, Identity, Merge, Segment, SegmentExt};
pub use value::Value;

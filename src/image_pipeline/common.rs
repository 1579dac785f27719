//! Common utilities module
//!
//! This module contains the error taxonomy shared by every pipeline stage.

pub mod error;

pub use error::{PipelineError, Result};

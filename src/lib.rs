//! Inference service: JSON records in, predictions out.
//!
//! ```text
//!  POST /predict {"data": [...]}
//!        │
//!        ▼
//!   data::convert  ──►  artifact::Processor  ──►  artifact::Model  ──►  {"predictions": [...]}
//! ```

pub mod api;
pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use error::{ConversionError, PipelineError, StartupError};
pub use pipeline::{InferencePipeline, PredictionVector};

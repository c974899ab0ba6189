//! Pre-trained artifacts: the feature processor and the predictive model.
//!
//! The pipeline only sees the [`Processor`] and [`Model`] traits. The
//! built-in kinds in [`processor`] and [`model`] are persisted as JSON files
//! tagged by `"kind"` and loaded once at startup.

pub mod model;
mod numeric;
pub mod processor;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::ArrayRef;
use log::info;
use serde::de::DeserializeOwned;

use crate::data::Table;
use crate::error::StartupError;

pub use model::ModelSpec;
pub use processor::ProcessorSpec;

pub const PROCESSOR_FILE: &str = "processor.json";
pub const MODEL_FILE: &str = "model.json";

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Feature transformation applied before prediction.
pub trait Processor: Send + Sync {
    fn transform(&self, table: &Table) -> anyhow::Result<Table>;
}

/// Produces one prediction per row of the (transformed) table.
pub trait Model: Send + Sync {
    fn predict(&self, table: &Table) -> anyhow::Result<ArrayRef>;
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// The loaded, read-only artifact pair.
#[derive(Clone)]
pub struct Artifacts {
    pub processor: Arc<dyn Processor>,
    pub model: Arc<dyn Model>,
}

impl Artifacts {
    /// Load `processor.json` and `model.json` from `dir`.
    ///
    /// Both files are checked for existence before either is parsed, so a
    /// missing-artifact error always names every absent file.
    pub fn load(dir: &Path) -> Result<Self, StartupError> {
        let processor_path = dir.join(PROCESSOR_FILE);
        let model_path = dir.join(MODEL_FILE);

        let missing: Vec<PathBuf> = [&processor_path, &model_path]
            .into_iter()
            .filter(|p| !p.is_file())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StartupError::ArtifactMissing { paths: missing });
        }

        let processor: ProcessorSpec = read_artifact(&processor_path)?;
        processor
            .validate()
            .map_err(|reason| rejected(&processor_path, reason))?;
        info!(
            "Loaded processor '{}' from {}",
            processor.kind_name(),
            processor_path.display()
        );

        let model: ModelSpec = read_artifact(&model_path)?;
        model.validate().map_err(|reason| rejected(&model_path, reason))?;
        info!(
            "Loaded model '{}' from {}",
            model.kind_name(),
            model_path.display()
        );

        Ok(Self {
            processor: Arc::new(processor),
            model: Arc::new(model),
        })
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, StartupError> {
    let bytes = std::fs::read(path).map_err(|source| StartupError::ArtifactRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StartupError::ArtifactInvalid {
        path: path.to_path_buf(),
        source,
    })
}

fn rejected(path: &Path, reason: String) -> StartupError {
    StartupError::ArtifactRejected {
        path: path.to_path_buf(),
        reason,
    }
}

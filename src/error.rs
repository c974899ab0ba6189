use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Startup – fatal, the service never becomes ready
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("artifact file(s) missing: {}", display_paths(.paths))]
    ArtifactMissing { paths: Vec<PathBuf> },

    #[error("reading artifact {}", .path.display())]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid artifact {}", .path.display())]
    ArtifactInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {} rejected: {reason}", .path.display())]
    ArtifactRejected { path: PathBuf, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Conversion – the records cannot form a rectangular table (client error)
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("input data is empty, expected at least one record")]
    Empty,

    #[error("record {index} is a {found}, expected an object")]
    NotAMapping { index: usize, found: &'static str },

    #[error("record {row}, column '{column}': nested arrays/objects are not supported")]
    NestedValue { row: usize, column: String },

    #[error("column '{column}' mixes {first} and {other} values")]
    MixedTypes {
        column: String,
        first: &'static str,
        other: &'static str,
    },

    #[error("building table: {0}")]
    Arrow(#[from] ArrowError),
}

// ---------------------------------------------------------------------------
// Pipeline – everything a single inference request can fail with
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("processor failed to transform the table")]
    Processing(#[source] anyhow::Error),

    #[error("model failed to predict")]
    Inference(#[source] anyhow::Error),

    #[error("unexpected error")]
    Unexpected(#[source] anyhow::Error),
}

impl PipelineError {
    /// Whether the caller has to fix their input (as opposed to a server-side fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Conversion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_every_path() {
        let err = StartupError::ArtifactMissing {
            paths: vec![PathBuf::from("a/processor.json"), PathBuf::from("a/model.json")],
        };
        assert_eq!(
            err.to_string(),
            "artifact file(s) missing: a/processor.json, a/model.json"
        );
    }

    #[test]
    fn only_conversion_is_client_error() {
        assert!(PipelineError::from(ConversionError::Empty).is_client_error());
        assert!(!PipelineError::Processing(anyhow::anyhow!("x")).is_client_error());
        assert!(!PipelineError::Inference(anyhow::anyhow!("x")).is_client_error());
        assert!(!PipelineError::Unexpected(anyhow::anyhow!("x")).is_client_error());
    }
}

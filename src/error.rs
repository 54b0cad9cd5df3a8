//! Error types for Moodcast

use thiserror::Error;

/// Errors that can occur during dataset preparation, training, or export
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Degenerate dataset: {0}")]
    DegenerateData(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),
}

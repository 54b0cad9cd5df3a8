//! Moodcast - Offline training pipeline for on-device mood classification
//!
//! Moodcast synthesizes a health-metrics dataset, labels it with heuristic
//! mood rules, balances and normalizes it, trains a small dense classifier,
//! and exports a portable inference artifact through a deterministic
//! pipeline: generation → labeling → balancing → normalization → training
//! → export.
//!
//! ## Modules
//!
//! - **Data prep**: Synthetic generation, heuristic labeling, class
//!   balancing, min-max normalization
//! - **Training**: Fixed-architecture dense classifier with Adam and
//!   cross-entropy
//! - **Artifacts**: Quantization-free JSON model snapshot plus a compressed
//!   normalization-bounds archive, and a predictor that consumes the pair

pub mod balancer;
pub mod error;
pub mod exporter;
pub mod generator;
pub mod labeler;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod predictor;
pub mod trainer;
pub mod types;

pub use error::PipelineError;
pub use pipeline::{run_training_pipeline, PipelineConfig, PipelineReport};

// Artifact exports
pub use exporter::{ModelArtifact, ModelExporter, ARTIFACT_FORMAT_VERSION};

// Inference exports
pub use predictor::{MoodPrediction, MoodPredictor};

/// Moodcast version embedded in all exported artifacts
pub const MOODCAST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exported artifacts
pub const PRODUCER_NAME: &str = "moodcast";

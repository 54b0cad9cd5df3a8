//! Pipeline orchestration
//!
//! This module provides the public API for a full training run. It sequences
//! the pipeline exactly once, with no feedback loops:
//! generation → labeling → balancing → normalization → training → export.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::balancer::ClassBalancer;
use crate::error::PipelineError;
use crate::exporter::{ModelExporter, DEFAULT_BOUNDS_PATH, DEFAULT_MODEL_PATH};
use crate::generator::SyntheticGenerator;
use crate::labeler::HeuristicLabeler;
use crate::model::MoodClassifier;
use crate::normalizer::Normalizer;
use crate::trainer::Trainer;
use crate::types::{
    Dataset, GeneratorConfig, NormalizationBounds, TrainingConfig, TrainingReport, NUM_CLASSES,
};

/// Configuration for one end-to-end training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub generator: GeneratorConfig,
    pub training: TrainingConfig,
    /// Output path for the model artifact
    pub model_path: PathBuf,
    /// Output path for the normalization bounds archive
    pub bounds_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            training: TrainingConfig::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            bounds_path: PathBuf::from(DEFAULT_BOUNDS_PATH),
        }
    }
}

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub samples_generated: usize,
    /// Class counts after labeling, in class-index order
    pub class_counts_raw: [usize; NUM_CLASSES],
    /// Class counts after balancing (all equal)
    pub class_counts_balanced: [usize; NUM_CLASSES],
    pub balanced_samples: usize,
    pub bounds: NormalizationBounds,
    pub training: TrainingReport,
    pub model_path: PathBuf,
    pub bounds_path: PathBuf,
}

/// Prepared training inputs: balanced labels, fitted bounds, scaled features
pub struct PreparedDataset {
    pub dataset: Dataset,
    pub bounds: NormalizationBounds,
    pub normalized: ndarray::Array2<f32>,
    pub class_counts_raw: [usize; NUM_CLASSES],
}

/// Run the data-prep stages: generate, label, balance, fit and apply bounds.
pub fn prepare_dataset(config: &GeneratorConfig) -> Result<PreparedDataset, PipelineError> {
    // Stage 1: Synthesize the raw feature matrix
    let features = SyntheticGenerator::generate(config)?;

    // Stage 2: Label every row with the ordered heuristic rules
    let mut rng = StdRng::seed_from_u64(config.seed);
    let labels = HeuristicLabeler::label_all(features.view(), &mut rng);
    let labeled = Dataset::new(features, labels)?;
    let class_counts_raw = labeled.class_counts();

    // Stage 3: Downsample every class to the minority count
    let balanced = ClassBalancer::balance(&labeled, &mut rng)?;

    // Stage 4: Fit bounds on the balanced set and scale it into [0, 1]
    let bounds = Normalizer::fit(balanced.features.view())?;
    let normalized = Normalizer::transform(balanced.features.view(), &bounds)?;

    Ok(PreparedDataset {
        dataset: balanced,
        bounds,
        normalized,
        class_counts_raw,
    })
}

/// Run the full pipeline once and write both artifacts.
pub fn run_training_pipeline(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    let prepared = prepare_dataset(&config.generator)?;

    // Stage 5: Train the fixed-architecture classifier
    let mut model_rng = StdRng::seed_from_u64(config.training.seed);
    let mut model = MoodClassifier::new(&mut model_rng)?;
    let trainer = Trainer::new(config.training.clone())?;
    let training = trainer.train(
        &mut model,
        prepared.normalized.view(),
        &prepared.dataset.labels,
    )?;

    // Stage 6: Export the model artifact and the bounds archive
    let exporter = ModelExporter::new();
    exporter.export_model(&model, &config.model_path)?;
    exporter.export_bounds(&prepared.bounds, &config.bounds_path)?;

    Ok(PipelineReport {
        samples_generated: config.generator.num_samples,
        class_counts_raw: prepared.class_counts_raw,
        class_counts_balanced: prepared.dataset.class_counts(),
        balanced_samples: prepared.dataset.len(),
        bounds: prepared.bounds,
        training,
        model_path: config.model_path.clone(),
        bounds_path: config.bounds_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::MoodPredictor;
    use crate::types::NUM_FEATURES;

    #[test]
    fn test_prepare_dataset_balances_and_normalizes() {
        let config = GeneratorConfig {
            num_samples: 1200,
            seed: 42,
        };
        let prepared = prepare_dataset(&config).unwrap();

        let counts = prepared.dataset.class_counts();
        assert!(counts[0] > 0, "expected at least one sample per class");
        assert!(counts.iter().all(|&c| c == counts[0]));

        assert_eq!(prepared.bounds.x_min.len(), NUM_FEATURES);
        assert_eq!(prepared.bounds.x_max.len(), NUM_FEATURES);

        for &v in prepared.normalized.iter() {
            assert!((0.0..=1.0).contains(&v), "normalized value {v} outside [0, 1]");
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_prepare_dataset_is_deterministic() {
        let config = GeneratorConfig {
            num_samples: 800,
            seed: 11,
        };
        let a = prepare_dataset(&config).unwrap();
        let b = prepare_dataset(&config).unwrap();

        assert_eq!(a.dataset.labels, b.dataset.labels);
        assert_eq!(a.bounds, b.bounds);
        assert_eq!(a.normalized, b.normalized);
    }

    #[test]
    fn test_full_pipeline_writes_loadable_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            generator: GeneratorConfig {
                num_samples: 1200,
                seed: 42,
            },
            training: TrainingConfig {
                epochs: 2,
                batch_size: 64,
                ..Default::default()
            },
            model_path: dir.path().join("model.json"),
            bounds_path: dir.path().join("norm.json.gz"),
        };

        let report = run_training_pipeline(&config).unwrap();

        assert_eq!(report.samples_generated, 1200);
        assert_eq!(report.training.epochs.len(), 2);
        let balanced = report.class_counts_balanced;
        assert!(balanced.iter().all(|&c| c == balanced[0]));
        assert_eq!(report.balanced_samples, balanced[0] * NUM_CLASSES);

        assert!(config.model_path.exists());
        assert!(config.bounds_path.exists());

        // The exported pair must be consumable by the inference path.
        let predictor = MoodPredictor::from_files(&config.model_path, &config.bounds_path).unwrap();
        let raw = [75.0, 7.0, 1.7, 1.6, 4.2, 0.6, 35.0, 9000.0, 3.5, 2.5, 2.0];
        let prediction = predictor.predict(&raw).unwrap();
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }
}

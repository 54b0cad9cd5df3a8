//! Core types for the Moodcast training pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: feature specifications, labeled datasets, normalization bounds,
//! and the generator/training configurations.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Number of input features per sample
pub const NUM_FEATURES: usize = 11;

/// Number of mood classes
pub const NUM_CLASSES: usize = 4;

/// Mood class assigned to a health-metric sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
    Stressed,
}

impl Mood {
    /// All moods in class-index order
    pub const ALL: [Mood; NUM_CLASSES] = [Mood::Happy, Mood::Neutral, Mood::Sad, Mood::Stressed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Stressed => "stressed",
        }
    }

    /// Class index used in model outputs (happy=0, neutral=1, sad=2, stressed=3)
    pub fn index(&self) -> usize {
        match self {
            Mood::Happy => 0,
            Mood::Neutral => 1,
            Mood::Sad => 2,
            Mood::Stressed => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Mood> {
        Mood::ALL.get(index).copied()
    }
}

/// Sampling distribution and clip bounds for one synthetic feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Feature name (stable, used in reports and artifacts)
    pub name: &'static str,
    /// Mean of the sampling normal distribution
    pub mean: f32,
    /// Standard deviation of the sampling normal distribution
    pub std_dev: f32,
    /// Lower clip bound applied after sampling
    pub clip_min: f32,
    /// Upper clip bound applied after sampling
    pub clip_max: f32,
}

/// Feature table in column order: heart rate, five sleep sub-metrics,
/// workout minutes, steps, screen time, social time, outdoor time.
pub const FEATURES: [FeatureSpec; NUM_FEATURES] = [
    FeatureSpec { name: "heart_rate", mean: 75.0, std_dev: 12.0, clip_min: 50.0, clip_max: 120.0 },
    FeatureSpec { name: "sleep_asleep", mean: 7.0, std_dev: 1.5, clip_min: 3.0, clip_max: 12.0 },
    FeatureSpec { name: "sleep_deep", mean: 1.7, std_dev: 0.5, clip_min: 0.2, clip_max: 3.0 },
    FeatureSpec { name: "sleep_rem", mean: 1.6, std_dev: 0.5, clip_min: 0.2, clip_max: 3.0 },
    FeatureSpec { name: "sleep_light", mean: 4.2, std_dev: 1.2, clip_min: 1.0, clip_max: 8.0 },
    FeatureSpec { name: "sleep_awake", mean: 0.6, std_dev: 0.3, clip_min: 0.0, clip_max: 2.0 },
    FeatureSpec { name: "workout", mean: 35.0, std_dev: 25.0, clip_min: 0.0, clip_max: 120.0 },
    FeatureSpec { name: "steps", mean: 9000.0, std_dev: 3000.0, clip_min: 1000.0, clip_max: 20000.0 },
    FeatureSpec { name: "screen_time", mean: 3.5, std_dev: 2.0, clip_min: 0.0, clip_max: 10.0 },
    FeatureSpec { name: "social_interaction", mean: 2.5, std_dev: 1.2, clip_min: 0.0, clip_max: 8.0 },
    FeatureSpec { name: "outdoor_time", mean: 2.0, std_dev: 1.2, clip_min: 0.0, clip_max: 8.0 },
];

/// Labeled dataset: one feature row per sample with a parallel label vector
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix, shape (samples, NUM_FEATURES)
    pub features: Array2<f32>,
    /// One label per row of `features`
    pub labels: Vec<Mood>,
}

impl Dataset {
    pub fn new(features: Array2<f32>, labels: Vec<Mood>) -> Result<Self, PipelineError> {
        if features.nrows() != labels.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "feature rows ({}) do not match label count ({})",
                features.nrows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sample count per mood class, in class-index order
    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0usize; NUM_CLASSES];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }
}

/// Per-feature (min, max) computed over the balanced training set.
///
/// Consumers must apply `(x - min) / (max - min + EPSILON)` with these stored
/// bounds at inference time, never recomputed bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBounds {
    /// Per-feature minimum over the training set
    pub x_min: Vec<f32>,
    /// Per-feature maximum over the training set
    pub x_max: Vec<f32>,
}

impl NormalizationBounds {
    pub fn feature_count(&self) -> usize {
        self.x_min.len()
    }

    /// Validate that both arrays cover the expected feature count
    pub fn validate(&self, expected_features: usize) -> Result<(), PipelineError> {
        if self.x_min.len() != expected_features || self.x_max.len() != expected_features {
            return Err(PipelineError::ShapeMismatch(format!(
                "bounds cover {} min / {} max features, expected {}",
                self.x_min.len(),
                self.x_max.len(),
                expected_features
            )));
        }
        Ok(())
    }
}

/// Configuration for the synthetic data generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of samples to synthesize
    pub num_samples: usize,
    /// RNG seed; the raw feature matrix is fully determined by this
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_samples: 6000,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.num_samples == 0 {
            return Err(PipelineError::InvalidConfig(
                "num_samples must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the training loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of full passes over the training set
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Trailing fraction of the dataset held out for validation (0.0..1.0)
    pub validation_split: f32,
    /// Adam learning rate
    pub learning_rate: f32,
    /// Seed for weight initialization and batch shuffling
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            validation_split: 0.15,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.epochs == 0 {
            return Err(PipelineError::InvalidConfig(
                "epochs must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::InvalidConfig(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Metrics recorded for one training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// Epoch number, 1-based
    pub epoch: usize,
    /// Mean cross-entropy loss over training batches
    pub loss: f32,
    /// Training accuracy (0-1)
    pub accuracy: f32,
    /// Cross-entropy loss on the held-out split, if any
    pub val_loss: Option<f32>,
    /// Accuracy on the held-out split, if any
    pub val_accuracy: Option<f32>,
}

/// Full training history, one entry per epoch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: Vec<EpochStats>,
}

impl TrainingReport {
    pub fn final_stats(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_index_round_trip() {
        for mood in Mood::ALL {
            assert_eq!(Mood::from_index(mood.index()), Some(mood));
        }
        assert_eq!(Mood::from_index(4), None);
    }

    #[test]
    fn test_feature_table_shape() {
        assert_eq!(FEATURES.len(), NUM_FEATURES);
        for spec in FEATURES {
            assert!(spec.clip_min < spec.clip_max, "{} has inverted bounds", spec.name);
            assert!(spec.std_dev > 0.0);
        }
    }

    #[test]
    fn test_dataset_rejects_mismatched_labels() {
        let features = Array2::<f32>::zeros((3, NUM_FEATURES));
        let labels = vec![Mood::Happy, Mood::Sad];
        assert!(Dataset::new(features, labels).is_err());
    }

    #[test]
    fn test_class_counts() {
        let features = Array2::<f32>::zeros((4, NUM_FEATURES));
        let labels = vec![Mood::Happy, Mood::Happy, Mood::Sad, Mood::Stressed];
        let dataset = Dataset::new(features, labels).unwrap();
        assert_eq!(dataset.class_counts(), [2, 0, 1, 1]);
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());

        let bad_split = TrainingConfig {
            validation_split: 1.0,
            ..Default::default()
        };
        assert!(bad_split.validate().is_err());

        let bad_epochs = TrainingConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(bad_epochs.validate().is_err());
    }

    #[test]
    fn test_bounds_validation() {
        let bounds = NormalizationBounds {
            x_min: vec![0.0; NUM_FEATURES],
            x_max: vec![1.0; NUM_FEATURES],
        };
        assert!(bounds.validate(NUM_FEATURES).is_ok());
        assert!(bounds.validate(NUM_FEATURES + 1).is_err());
    }
}

//! Inference-side consumer
//!
//! Loads an exported model artifact together with its normalization bounds
//! and classifies raw (unnormalized) feature vectors the same way a mobile
//! runtime consuming the artifacts would: apply the stored bounds with
//! `(x - min) / (max - min + epsilon)`, run the forward pass, take the argmax
//! class. The bounds must be the ones exported alongside the model; pairing a
//! model with foreign bounds is a deployment error this module cannot detect.

use std::path::Path;

use crate::error::PipelineError;
use crate::exporter::ModelExporter;
use crate::model::MoodClassifier;
use crate::normalizer::Normalizer;
use crate::types::{Mood, NormalizationBounds, NUM_FEATURES};

/// Prediction result: argmax mood plus the full probability vector
#[derive(Debug, Clone)]
pub struct MoodPrediction {
    pub mood: Mood,
    /// Class probabilities in output-index order
    pub probabilities: Vec<f32>,
}

impl MoodPrediction {
    /// Probability of the predicted mood
    pub fn confidence(&self) -> f32 {
        self.probabilities
            .get(self.mood.index())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Predictor pairing a loaded model with its normalization bounds
pub struct MoodPredictor {
    model: MoodClassifier,
    bounds: NormalizationBounds,
}

impl MoodPredictor {
    pub fn new(model: MoodClassifier, bounds: NormalizationBounds) -> Result<Self, PipelineError> {
        bounds.validate(NUM_FEATURES)?;
        Ok(Self { model, bounds })
    }

    /// Load the artifact pair produced by the exporter.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        bounds_path: Q,
    ) -> Result<Self, PipelineError> {
        let artifact = ModelExporter::load_artifact(model_path)?;
        let model = artifact.to_model()?;
        let bounds = ModelExporter::load_bounds(bounds_path)?;
        Self::new(model, bounds)
    }

    pub fn bounds(&self) -> &NormalizationBounds {
        &self.bounds
    }

    /// Classify one raw feature vector in the documented feature order.
    pub fn predict(&self, raw_features: &[f32]) -> Result<MoodPrediction, PipelineError> {
        if raw_features.len() != NUM_FEATURES {
            return Err(PipelineError::ShapeMismatch(format!(
                "expected {} features, got {}",
                NUM_FEATURES,
                raw_features.len()
            )));
        }
        let normalized = Normalizer::transform_row(raw_features, &self.bounds)?;
        let (mood, probabilities) = self.model.predict(&normalized)?;
        Ok(MoodPrediction {
            mood,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::ModelExporter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_parts() -> (MoodClassifier, NormalizationBounds) {
        let mut rng = StdRng::seed_from_u64(42);
        let model = MoodClassifier::new(&mut rng).unwrap();
        let bounds = NormalizationBounds {
            x_min: crate::types::FEATURES.iter().map(|f| f.clip_min).collect(),
            x_max: crate::types::FEATURES.iter().map(|f| f.clip_max).collect(),
        };
        (model, bounds)
    }

    #[test]
    fn test_predict_returns_valid_distribution() {
        let (model, bounds) = make_parts();
        let predictor = MoodPredictor::new(model, bounds).unwrap();

        let raw = [75.0, 7.0, 1.7, 1.6, 4.2, 0.6, 35.0, 9000.0, 3.5, 2.5, 2.0];
        let prediction = predictor.predict(&raw).unwrap();

        assert_eq!(prediction.probabilities.len(), 4);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(prediction.confidence() > 0.0);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (model, bounds) = make_parts();
        let predictor = MoodPredictor::new(model, bounds).unwrap();
        assert!(predictor.predict(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_from_files_matches_in_memory_model() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let bounds_path = dir.path().join("norm.json.gz");

        let (model, bounds) = make_parts();
        let exporter = ModelExporter::new();
        exporter.export_model(&model, &model_path).unwrap();
        exporter.export_bounds(&bounds, &bounds_path).unwrap();

        let predictor = MoodPredictor::from_files(&model_path, &bounds_path).unwrap();

        let raw = [80.0, 6.5, 1.2, 1.4, 4.0, 0.8, 20.0, 7000.0, 5.0, 1.5, 1.0];
        let from_disk = predictor.predict(&raw).unwrap();

        let normalized = Normalizer::transform_row(&raw, predictor.bounds()).unwrap();
        let (mood, probs) = model.predict(&normalized).unwrap();

        assert_eq!(from_disk.mood, mood);
        for (a, b) in from_disk.probabilities.iter().zip(&probs) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

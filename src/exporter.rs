//! Artifact export and loading
//!
//! Serializes the trained model to a portable, quantization-free JSON
//! snapshot (format version, producer metadata, architecture, per-layer
//! weights) and persists the normalization bounds as a gzip-compressed JSON
//! file with the two named arrays `x_min` and `x_max`. Both files together
//! form the deployment contract: a consumer must load the pair and apply the
//! stored bounds, never recomputed ones.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::{Activation, DenseLayer, MoodClassifier};
use crate::types::{Mood, NormalizationBounds, NUM_FEATURES};
use crate::{MOODCAST_VERSION, PRODUCER_NAME};

/// Current artifact format version
pub const ARTIFACT_FORMAT_VERSION: &str = "1.0.0";

/// Default output path for the model artifact
pub const DEFAULT_MODEL_PATH: &str = "assets/mood_model.json";

/// Default output path for the normalization bounds archive
pub const DEFAULT_BOUNDS_PATH: &str = "assets/mood_norm.json.gz";

/// Producer metadata embedded in every artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One serialized dense layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Output width of the layer
    pub units: usize,
    pub activation: Activation,
    /// Weight rows, one per input, each of length `units`
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
}

/// Portable model snapshot, immutable after export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: String,
    pub producer: ArtifactProducer,
    /// RFC3339 timestamp of export
    pub trained_at: String,
    pub input_width: usize,
    /// Class names in output-index order
    pub classes: Vec<String>,
    pub layers: Vec<LayerSnapshot>,
}

impl ModelArtifact {
    /// Rebuild an in-memory classifier from the snapshot, validating shapes.
    pub fn to_model(&self) -> Result<MoodClassifier, PipelineError> {
        if self.input_width != NUM_FEATURES {
            return Err(PipelineError::ArtifactError(format!(
                "artifact input width {} does not match expected {}",
                self.input_width, NUM_FEATURES
            )));
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        for (i, snapshot) in self.layers.iter().enumerate() {
            let inputs = snapshot.weights.len();
            if inputs == 0 {
                return Err(PipelineError::ArtifactError(format!(
                    "layer {i} has no weight rows"
                )));
            }
            let mut flat = Vec::with_capacity(inputs * snapshot.units);
            for row in &snapshot.weights {
                if row.len() != snapshot.units {
                    return Err(PipelineError::ShapeMismatch(format!(
                        "layer {i}: weight row of length {} does not match {} units",
                        row.len(),
                        snapshot.units
                    )));
                }
                flat.extend_from_slice(row);
            }
            let weights = Array2::from_shape_vec((inputs, snapshot.units), flat)
                .map_err(|e| PipelineError::ShapeMismatch(e.to_string()))?;
            if snapshot.biases.len() != snapshot.units {
                return Err(PipelineError::ShapeMismatch(format!(
                    "layer {i}: {} biases for {} units",
                    snapshot.biases.len(),
                    snapshot.units
                )));
            }
            let biases = Array1::from_vec(snapshot.biases.clone());
            layers.push(DenseLayer {
                weights,
                biases,
                activation: snapshot.activation,
            });
        }

        MoodClassifier::from_layers(layers)
    }
}

/// Exporter writing the model artifact and bounds archive
pub struct ModelExporter {
    instance_id: String,
}

impl Default for ModelExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelExporter {
    /// Create an exporter with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an exporter with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the portable snapshot for a trained model.
    pub fn snapshot(&self, model: &MoodClassifier) -> ModelArtifact {
        let layers = model
            .layers()
            .iter()
            .map(|layer| LayerSnapshot {
                units: layer.units(),
                activation: layer.activation,
                weights: layer.weights.outer_iter().map(|row| row.to_vec()).collect(),
                biases: layer.biases.to_vec(),
            })
            .collect();

        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION.to_string(),
            producer: ArtifactProducer {
                name: PRODUCER_NAME.to_string(),
                version: MOODCAST_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            trained_at: Utc::now().to_rfc3339(),
            input_width: NUM_FEATURES,
            classes: Mood::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            layers,
        }
    }

    /// Serialize the model snapshot to JSON at `path`.
    pub fn export_model<P: AsRef<Path>>(
        &self,
        model: &MoodClassifier,
        path: P,
    ) -> Result<(), PipelineError> {
        let artifact = self.snapshot(model);
        let json = serde_json::to_string(&artifact)?;
        ensure_parent_dir(path.as_ref())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Write the normalization bounds as gzip-compressed JSON at `path`.
    pub fn export_bounds<P: AsRef<Path>>(
        &self,
        bounds: &NormalizationBounds,
        path: P,
    ) -> Result<(), PipelineError> {
        bounds.validate(NUM_FEATURES)?;
        ensure_parent_dir(path.as_ref())?;
        let file = fs::File::create(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        let json = serde_json::to_string(bounds)?;
        encoder.write_all(json.as_bytes())?;
        encoder.finish()?;
        Ok(())
    }

    /// Load a model snapshot from a JSON artifact file.
    pub fn load_artifact<P: AsRef<Path>>(path: P) -> Result<ModelArtifact, PipelineError> {
        let json = fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&json)?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::ArtifactError(format!(
                "unsupported artifact format version {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        Ok(artifact)
    }

    /// Load normalization bounds from a gzip-compressed JSON file.
    pub fn load_bounds<P: AsRef<Path>>(path: P) -> Result<NormalizationBounds, PipelineError> {
        let file = fs::File::open(path)?;
        let mut decoder = GzDecoder::new(file);
        let mut json = String::new();
        decoder.read_to_string(&mut json)?;
        let bounds: NormalizationBounds = serde_json::from_str(&json)?;
        bounds.validate(NUM_FEATURES)?;
        Ok(bounds)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_model() -> MoodClassifier {
        let mut rng = StdRng::seed_from_u64(42);
        MoodClassifier::new(&mut rng).unwrap()
    }

    #[test]
    fn test_snapshot_covers_architecture() {
        let model = make_model();
        let exporter = ModelExporter::with_instance_id("test-instance".to_string());
        let artifact = exporter.snapshot(&model);

        assert_eq!(artifact.format_version, ARTIFACT_FORMAT_VERSION);
        assert_eq!(artifact.producer.name, PRODUCER_NAME);
        assert_eq!(artifact.producer.instance_id, "test-instance");
        assert_eq!(artifact.input_width, NUM_FEATURES);
        assert_eq!(artifact.classes, vec!["happy", "neutral", "sad", "stressed"]);

        let units: Vec<usize> = artifact.layers.iter().map(|l| l.units).collect();
        assert_eq!(units, vec![128, 64, 32, 16, 4]);
        assert_eq!(artifact.layers[0].weights.len(), NUM_FEATURES);
    }

    #[test]
    fn test_model_round_trip_preserves_predictions() {
        let model = make_model();
        let exporter = ModelExporter::new();
        let artifact = exporter.snapshot(&model);
        let restored = artifact.to_model().unwrap();

        let input = [0.3f32; NUM_FEATURES];
        let original = model.predict_probs(&input).unwrap();
        let reloaded = restored.predict_probs(&input).unwrap();
        for (a, b) in original.iter().zip(&reloaded) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let bounds_path = dir.path().join("norm.json.gz");

        let model = make_model();
        let bounds = NormalizationBounds {
            x_min: vec![0.0; NUM_FEATURES],
            x_max: vec![1.0; NUM_FEATURES],
        };

        let exporter = ModelExporter::new();
        exporter.export_model(&model, &model_path).unwrap();
        exporter.export_bounds(&bounds, &bounds_path).unwrap();

        let artifact = ModelExporter::load_artifact(&model_path).unwrap();
        let restored = artifact.to_model().unwrap();
        let loaded_bounds = ModelExporter::load_bounds(&bounds_path).unwrap();

        assert_eq!(loaded_bounds, bounds);
        assert_eq!(loaded_bounds.x_min.len(), NUM_FEATURES);
        assert_eq!(loaded_bounds.x_max.len(), NUM_FEATURES);

        let input = [0.7f32; NUM_FEATURES];
        let original = model.predict_probs(&input).unwrap();
        let reloaded = restored.predict_probs(&input).unwrap();
        for (a, b) in original.iter().zip(&reloaded) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_corrupt_layer_shape_rejected() {
        let model = make_model();
        let exporter = ModelExporter::new();
        let mut artifact = exporter.snapshot(&model);
        artifact.layers[1].weights[0].pop();
        assert!(artifact.to_model().is_err());
    }

    #[test]
    fn test_unknown_format_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let model = make_model();
        let exporter = ModelExporter::new();
        let mut artifact = exporter.snapshot(&model);
        artifact.format_version = "9.9.9".to_string();
        fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();

        assert!(ModelExporter::load_artifact(&path).is_err());
    }
}

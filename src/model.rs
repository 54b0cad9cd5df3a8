//! Dense classifier model
//!
//! Fixed architecture: 11 inputs, four relu hidden layers (128/64/32/16), and
//! a 4-way softmax head. The model holds plain `ndarray` weight matrices so
//! the trainer can run backpropagation over them and the exporter can
//! serialize them layer by layer.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::{Mood, NUM_CLASSES, NUM_FEATURES};

/// Hidden layer widths, in order
pub const HIDDEN_WIDTHS: [usize; 4] = [128, 64, 32, 16];

/// Layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Softmax,
}

impl Activation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Softmax => "softmax",
        }
    }
}

/// One fully connected layer
#[derive(Debug, Clone)]
pub struct DenseLayer {
    /// Weight matrix, shape (inputs, units)
    pub weights: Array2<f32>,
    /// Bias vector, shape (units,)
    pub biases: Array1<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    /// He-normal initialization scaled by fan-in; biases start at zero.
    fn init<R: Rng>(
        inputs: usize,
        units: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self, PipelineError> {
        let std_dev = (2.0 / inputs as f32).sqrt();
        let normal = Normal::new(0.0, std_dev).map_err(|e| {
            PipelineError::InvalidConfig(format!("weight init distribution: {e}"))
        })?;
        let weights = Array2::from_shape_fn((inputs, units), |_| normal.sample(rng));
        let biases = Array1::zeros(units);
        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    /// Affine transform without activation
    pub(crate) fn pre_activation(&self, input: &Array2<f32>) -> Array2<f32> {
        input.dot(&self.weights) + &self.biases
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn units(&self) -> usize {
        self.weights.ncols()
    }
}

/// Apply an activation function to a batch of pre-activations
pub(crate) fn apply_activation(mut z: Array2<f32>, activation: Activation) -> Array2<f32> {
    match activation {
        Activation::Relu => {
            z.mapv_inplace(|v| v.max(0.0));
            z
        }
        Activation::Softmax => {
            for mut row in z.rows_mut() {
                let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
                row.mapv_inplace(|v| (v - max).exp());
                let sum = row.sum();
                if sum > 0.0 {
                    row.mapv_inplace(|v| v / sum);
                }
            }
            z
        }
    }
}

/// Feed-forward mood classifier
#[derive(Debug, Clone)]
pub struct MoodClassifier {
    layers: Vec<DenseLayer>,
}

impl MoodClassifier {
    /// Build the fixed architecture with seeded He-normal weights.
    pub fn new<R: Rng>(rng: &mut R) -> Result<Self, PipelineError> {
        let mut layers = Vec::with_capacity(HIDDEN_WIDTHS.len() + 1);
        let mut inputs = NUM_FEATURES;
        for units in HIDDEN_WIDTHS {
            layers.push(DenseLayer::init(inputs, units, Activation::Relu, rng)?);
            inputs = units;
        }
        layers.push(DenseLayer::init(inputs, NUM_CLASSES, Activation::Softmax, rng)?);
        Ok(Self { layers })
    }

    /// Rebuild a classifier from explicit layers, validating that the shapes
    /// chain from the feature width down to the class count.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self, PipelineError> {
        if layers.is_empty() {
            return Err(PipelineError::ArtifactError(
                "model has no layers".to_string(),
            ));
        }
        let mut expected_inputs = NUM_FEATURES;
        for (i, layer) in layers.iter().enumerate() {
            if layer.inputs() != expected_inputs {
                return Err(PipelineError::ShapeMismatch(format!(
                    "layer {} expects {} inputs, previous layer provides {}",
                    i,
                    layer.inputs(),
                    expected_inputs
                )));
            }
            if layer.biases.len() != layer.units() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "layer {} has {} biases for {} units",
                    i,
                    layer.biases.len(),
                    layer.units()
                )));
            }
            expected_inputs = layer.units();
        }
        if expected_inputs != NUM_CLASSES {
            return Err(PipelineError::ShapeMismatch(format!(
                "output layer has {expected_inputs} units, expected {NUM_CLASSES}"
            )));
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    /// Forward pass over a batch of rows, returning class probabilities.
    pub fn forward(&self, input: ArrayView2<f32>) -> Array2<f32> {
        let mut activation = input.to_owned();
        for layer in &self.layers {
            let z = layer.pre_activation(&activation);
            activation = apply_activation(z, layer.activation);
        }
        activation
    }

    /// Forward pass recording pre-activations and activations per layer.
    ///
    /// `activations[0]` is the input batch; `zs[i]` and `activations[i + 1]`
    /// belong to layer `i`.
    pub(crate) fn forward_full(
        &self,
        input: &Array2<f32>,
    ) -> (Vec<Array2<f32>>, Vec<Array2<f32>>) {
        let mut zs = Vec::with_capacity(self.layers.len());
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut current = input.clone();
        activations.push(current.clone());
        for layer in &self.layers {
            let z = layer.pre_activation(&current);
            zs.push(z.clone());
            current = apply_activation(z, layer.activation);
            activations.push(current.clone());
        }
        (zs, activations)
    }

    /// Class probabilities for a single already-normalized feature vector.
    pub fn predict_probs(&self, row: &[f32]) -> Result<Vec<f32>, PipelineError> {
        if row.len() != NUM_FEATURES {
            return Err(PipelineError::ShapeMismatch(format!(
                "expected {} features, got {}",
                NUM_FEATURES,
                row.len()
            )));
        }
        let input = Array2::from_shape_vec((1, NUM_FEATURES), row.to_vec())
            .map_err(|e| PipelineError::ShapeMismatch(e.to_string()))?;
        let probs = self.forward(input.view());
        Ok(probs.row(0).to_vec())
    }

    /// Argmax mood plus class probabilities for one normalized vector.
    pub fn predict(&self, row: &[f32]) -> Result<(Mood, Vec<f32>), PipelineError> {
        let probs = self.predict_probs(row)?;
        let (best_idx, _) = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| PipelineError::ShapeMismatch("empty probability vector".to_string()))?;
        let mood = Mood::from_index(best_idx).ok_or_else(|| {
            PipelineError::ShapeMismatch(format!("class index {best_idx} out of range"))
        })?;
        Ok((mood, probs))
    }

    /// Batch accuracy against the given labels.
    pub fn accuracy(&self, features: ArrayView2<f32>, labels: &[Mood]) -> f32 {
        if labels.is_empty() {
            return 0.0;
        }
        let probs = self.forward(features);
        let correct = probs
            .axis_iter(Axis(0))
            .zip(labels)
            .filter(|(row, label)| {
                let (best, _) = row.iter().enumerate().fold(
                    (0usize, f32::NEG_INFINITY),
                    |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) },
                );
                best == label.index()
            })
            .count();
        correct as f32 / labels.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_architecture_shapes_chain() {
        let mut rng = StdRng::seed_from_u64(42);
        let model = MoodClassifier::new(&mut rng).unwrap();

        let dims: Vec<(usize, usize)> = model
            .layers()
            .iter()
            .map(|l| (l.inputs(), l.units()))
            .collect();
        assert_eq!(dims, vec![(11, 128), (128, 64), (64, 32), (32, 16), (16, 4)]);
        assert_eq!(model.layers().last().unwrap().activation, Activation::Softmax);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(42);
        let model = MoodClassifier::new(&mut rng).unwrap();
        let input = Array2::from_elem((3, NUM_FEATURES), 0.5);
        let probs = model.forward(input.view());

        assert_eq!(probs.dim(), (3, NUM_CLASSES));
        for row in probs.rows() {
            let sum: f32 = row.sum();
            assert!((sum - 1.0).abs() < 1e-5, "row sums to {sum}");
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let mut rng = StdRng::seed_from_u64(42);
        let model = MoodClassifier::new(&mut rng).unwrap();
        assert!(model.predict(&[0.5; 7]).is_err());
    }

    #[test]
    fn test_from_layers_rejects_broken_chain() {
        let mut rng = StdRng::seed_from_u64(42);
        let model = MoodClassifier::new(&mut rng).unwrap();
        let mut layers: Vec<DenseLayer> = model.layers().to_vec();
        layers.remove(2);
        assert!(MoodClassifier::from_layers(layers).is_err());
    }

    #[test]
    fn test_relu_clamps_negative() {
        let z = ndarray::arr2(&[[-1.0, 2.0], [0.0, -3.0]]);
        let out = apply_activation(z, Activation::Relu);
        assert_eq!(out, ndarray::arr2(&[[0.0, 2.0], [0.0, 0.0]]));
    }
}

//! Model training
//!
//! Mini-batch training loop for the dense classifier: softmax cross-entropy
//! loss, Adam optimizer, fixed epoch count and batch size, and a trailing
//! validation split evaluated once per epoch. There is no early stopping,
//! checkpointing, or hyperparameter search.

use ndarray::{s, Array, Array2, ArrayView2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::model::{DenseLayer, MoodClassifier};
use crate::types::{EpochStats, Mood, TrainingConfig, TrainingReport, NUM_CLASSES};

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const ADAM_EPSILON: f32 = 1e-7;
// Floor inside ln() so a zero probability cannot produce -inf loss
const LOG_EPSILON: f32 = 1e-12;

/// Trainer running the configured loop over a prepared dataset
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train the model in place and return the per-epoch history.
    ///
    /// The trailing `validation_split` fraction of rows is held out; the rest
    /// is shuffled into mini-batches each epoch.
    pub fn train(
        &self,
        model: &mut MoodClassifier,
        features: ArrayView2<f32>,
        labels: &[Mood],
    ) -> Result<TrainingReport, PipelineError> {
        let n = features.nrows();
        if n != labels.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "feature rows ({n}) do not match label count ({})",
                labels.len()
            )));
        }
        if n == 0 {
            return Err(PipelineError::DegenerateData(
                "cannot train on an empty dataset".to_string(),
            ));
        }

        let val_len = (n as f32 * self.config.validation_split) as usize;
        let train_len = n - val_len;
        if train_len == 0 {
            return Err(PipelineError::InvalidConfig(
                "validation split leaves no training samples".to_string(),
            ));
        }

        let train_x = features.slice(s![..train_len, ..]).to_owned();
        let train_labels = &labels[..train_len];
        let train_y = one_hot(train_labels);

        let (val_x, val_labels, val_y) = if val_len > 0 {
            let x = features.slice(s![train_len.., ..]).to_owned();
            let l = &labels[train_len..];
            let y = one_hot(l);
            (Some(x), Some(l), Some(y))
        } else {
            (None, None, None)
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut adam = AdamState::new(model.layers());
        let mut report = TrainingReport::default();
        let mut indices: Vec<usize> = (0..train_len).collect();

        for epoch in 1..=self.config.epochs {
            indices.shuffle(&mut rng);

            let mut epoch_loss = 0.0f32;
            for batch in indices.chunks(self.config.batch_size) {
                let batch_x = train_x.select(Axis(0), batch);
                let batch_y = train_y.select(Axis(0), batch);

                let batch_loss = self.train_batch(model, &mut adam, &batch_x, &batch_y)?;
                epoch_loss += batch_loss * batch.len() as f32;
            }
            epoch_loss /= train_len as f32;

            let accuracy = model.accuracy(train_x.view(), train_labels);

            let (val_loss, val_accuracy) = match (&val_x, &val_labels, &val_y) {
                (Some(x), Some(l), Some(y)) => {
                    let probs = model.forward(x.view());
                    (
                        Some(cross_entropy(&probs, y)),
                        Some(model.accuracy(x.view(), l)),
                    )
                }
                _ => (None, None),
            };

            report.epochs.push(EpochStats {
                epoch,
                loss: epoch_loss,
                accuracy,
                val_loss,
                val_accuracy,
            });
        }

        Ok(report)
    }

    /// One forward/backward pass over a mini-batch. Returns the batch loss.
    fn train_batch(
        &self,
        model: &mut MoodClassifier,
        adam: &mut AdamState,
        batch_x: &Array2<f32>,
        batch_y: &Array2<f32>,
    ) -> Result<f32, PipelineError> {
        let batch_len = batch_x.nrows() as f32;
        let (zs, activations) = model.forward_full(batch_x);
        let probs = activations
            .last()
            .ok_or_else(|| PipelineError::TrainingError("forward pass produced no output".to_string()))?;
        let loss = cross_entropy(probs, batch_y);
        if !loss.is_finite() {
            return Err(PipelineError::TrainingError(format!(
                "non-finite loss ({loss}) at optimizer step {}",
                adam.step
            )));
        }

        // Softmax + cross-entropy gradient collapses to (probs - targets).
        let mut delta = (probs - batch_y) / batch_len;

        adam.step += 1;
        let num_layers = model.layers().len();
        for l in (0..num_layers).rev() {
            let grad_w = activations[l].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));

            if l > 0 {
                let back = delta.dot(&model.layers()[l].weights.t());
                let relu_mask = zs[l - 1].mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
                delta = back * relu_mask;
            }

            adam.apply(l, &mut model.layers_mut()[l], &grad_w, &grad_b, self.config.learning_rate);
        }

        Ok(loss)
    }
}

/// One-hot encode labels into a (samples, NUM_CLASSES) matrix
fn one_hot(labels: &[Mood]) -> Array2<f32> {
    let mut targets = Array2::<f32>::zeros((labels.len(), NUM_CLASSES));
    for (row, label) in labels.iter().enumerate() {
        targets[[row, label.index()]] = 1.0;
    }
    targets
}

/// Mean cross-entropy of predicted probabilities against one-hot targets
fn cross_entropy(probs: &Array2<f32>, targets: &Array2<f32>) -> f32 {
    let rows = probs.nrows().max(1) as f32;
    let mut total = 0.0f32;
    Zip::from(probs).and(targets).for_each(|&p, &t| {
        if t > 0.0 {
            total -= t * (p + LOG_EPSILON).ln();
        }
    });
    total / rows
}

/// Adam first/second moment estimates, one pair per layer parameter tensor
struct AdamState {
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<ndarray::Array1<f32>>,
    v_biases: Vec<ndarray::Array1<f32>>,
    step: i32,
}

impl AdamState {
    fn new(layers: &[DenseLayer]) -> Self {
        Self {
            m_weights: layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            v_weights: layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            m_biases: layers.iter().map(|l| ndarray::Array1::zeros(l.biases.len())).collect(),
            v_biases: layers.iter().map(|l| ndarray::Array1::zeros(l.biases.len())).collect(),
            step: 0,
        }
    }

    fn apply(
        &mut self,
        layer_idx: usize,
        layer: &mut DenseLayer,
        grad_w: &Array2<f32>,
        grad_b: &ndarray::Array1<f32>,
        learning_rate: f32,
    ) {
        adam_update(
            &mut layer.weights,
            grad_w,
            &mut self.m_weights[layer_idx],
            &mut self.v_weights[layer_idx],
            learning_rate,
            self.step,
        );
        adam_update(
            &mut layer.biases,
            grad_b,
            &mut self.m_biases[layer_idx],
            &mut self.v_biases[layer_idx],
            learning_rate,
            self.step,
        );
    }
}

/// Bias-corrected Adam update, elementwise over any parameter tensor
fn adam_update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    learning_rate: f32,
    step: i32,
) {
    let m_correction = 1.0 - BETA1.powi(step);
    let v_correction = 1.0 - BETA2.powi(step);
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            let m_hat = *m / m_correction;
            let v_hat = *v / v_correction;
            *p -= learning_rate * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
        });
}

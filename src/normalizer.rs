//! Feature normalization
//!
//! This module min-max scales every feature into [0, 1] using bounds computed
//! over the balanced training set. The bounds are persisted alongside the
//! model so inference applies the exact same scaling; recomputing bounds on
//! other data is a deployment error, not something handled here.

use ndarray::{Array2, ArrayView2};

use crate::error::PipelineError;
use crate::types::NormalizationBounds;

/// Epsilon added to the denominator so constant features divide cleanly
pub const EPSILON: f32 = 1e-8;

/// Min-max normalizer over a training feature matrix
pub struct Normalizer;

impl Normalizer {
    /// Compute per-feature min and max over the given matrix.
    pub fn fit(features: ArrayView2<f32>) -> Result<NormalizationBounds, PipelineError> {
        if features.nrows() == 0 {
            return Err(PipelineError::DegenerateData(
                "cannot fit normalization bounds on an empty matrix".to_string(),
            ));
        }

        let mut x_min = Vec::with_capacity(features.ncols());
        let mut x_max = Vec::with_capacity(features.ncols());
        for col in features.columns() {
            let mut lo = f32::INFINITY;
            let mut hi = f32::NEG_INFINITY;
            for &v in col {
                lo = lo.min(v);
                hi = hi.max(v);
            }
            x_min.push(lo);
            x_max.push(hi);
        }

        Ok(NormalizationBounds { x_min, x_max })
    }

    /// Rescale every feature to [0, 1] with `(x - min) / (max - min + EPSILON)`.
    pub fn transform(
        features: ArrayView2<f32>,
        bounds: &NormalizationBounds,
    ) -> Result<Array2<f32>, PipelineError> {
        bounds.validate(features.ncols())?;

        let mut scaled = features.to_owned();
        for (col, mut column) in scaled.columns_mut().into_iter().enumerate() {
            let lo = bounds.x_min[col];
            let range = bounds.x_max[col] - lo + EPSILON;
            column.mapv_inplace(|v| (v - lo) / range);
        }
        Ok(scaled)
    }

    /// Normalize a single feature vector with stored bounds (inference path).
    pub fn transform_row(
        row: &[f32],
        bounds: &NormalizationBounds,
    ) -> Result<Vec<f32>, PipelineError> {
        bounds.validate(row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(i, &v)| (v - bounds.x_min[i]) / (bounds.x_max[i] - bounds.x_min[i] + EPSILON))
            .collect())
    }
}

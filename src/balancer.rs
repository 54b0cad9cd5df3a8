//! Class balancing
//!
//! This module downsamples every mood class to the minority class count so
//! the trainer sees equal label cardinalities. Each class's indices are
//! shuffled before truncation; sample order in the output has no meaning.

use ndarray::Axis;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PipelineError;
use crate::types::{Dataset, Mood};

/// Balancer producing equal per-class sample counts
pub struct ClassBalancer;

impl ClassBalancer {
    /// Downsample each class to the global minimum class count via
    /// shuffle-then-truncate. Classes are emitted in label-index order.
    pub fn balance<R: Rng>(dataset: &Dataset, rng: &mut R) -> Result<Dataset, PipelineError> {
        if dataset.is_empty() {
            return Err(PipelineError::DegenerateData(
                "cannot balance an empty dataset".to_string(),
            ));
        }

        let counts = dataset.class_counts();
        let min_count = counts.iter().copied().min().unwrap_or(0);
        if min_count == 0 {
            let missing = Mood::ALL
                .iter()
                .filter(|m| counts[m.index()] == 0)
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PipelineError::DegenerateData(format!(
                "no samples for class(es): {missing}"
            )));
        }

        let mut selected: Vec<usize> = Vec::with_capacity(min_count * Mood::ALL.len());
        for mood in Mood::ALL {
            let mut indices: Vec<usize> = dataset
                .labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == mood)
                .map(|(i, _)| i)
                .collect();
            indices.shuffle(rng);
            indices.truncate(min_count);
            selected.extend(indices);
        }

        let features = dataset.features.select(Axis(0), &selected);
        let labels = selected.iter().map(|&i| dataset.labels[i]).collect();

        Dataset::new(features, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NUM_CLASSES, NUM_FEATURES};
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_unbalanced() -> Dataset {
        // 10 happy, 6 neutral, 3 sad, 5 stressed; rows tagged with their index
        // in column 0 so selection can be traced back.
        let labels: Vec<Mood> = std::iter::empty()
            .chain(std::iter::repeat(Mood::Happy).take(10))
            .chain(std::iter::repeat(Mood::Neutral).take(6))
            .chain(std::iter::repeat(Mood::Sad).take(3))
            .chain(std::iter::repeat(Mood::Stressed).take(5))
            .collect();
        let features = Array2::from_shape_fn((labels.len(), NUM_FEATURES), |(r, c)| {
            if c == 0 {
                r as f32
            } else {
                0.0
            }
        });
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_all_classes_equal_after_balance() {
        let dataset = make_unbalanced();
        let mut rng = StdRng::seed_from_u64(42);
        let balanced = ClassBalancer::balance(&dataset, &mut rng).unwrap();

        assert_eq!(balanced.len(), 3 * NUM_CLASSES);
        assert_eq!(balanced.class_counts(), [3, 3, 3, 3]);
    }

    #[test]
    fn test_rows_keep_their_labels() {
        let dataset = make_unbalanced();
        let mut rng = StdRng::seed_from_u64(42);
        let balanced = ClassBalancer::balance(&dataset, &mut rng).unwrap();

        // Column 0 carries the original row index; the label at that index in
        // the source dataset must match the balanced label.
        for (row, label) in balanced.features.outer_iter().zip(&balanced.labels) {
            let original = row[0] as usize;
            assert_eq!(dataset.labels[original], *label);
        }
    }

    #[test]
    fn test_missing_class_is_an_error() {
        let features = Array2::<f32>::zeros((4, NUM_FEATURES));
        let labels = vec![Mood::Happy, Mood::Happy, Mood::Sad, Mood::Stressed];
        let dataset = Dataset::new(features, labels).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let result = ClassBalancer::balance(&dataset, &mut rng);
        assert!(matches!(result, Err(PipelineError::DegenerateData(_))));
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let dataset = Dataset::new(Array2::<f32>::zeros((0, NUM_FEATURES)), vec![]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        assert!(ClassBalancer::balance(&dataset, &mut rng).is_err());
    }
}

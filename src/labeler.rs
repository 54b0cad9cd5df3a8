//! Heuristic mood labeling
//!
//! This module assigns a mood class to each feature vector with an ordered set
//! of threshold rules. The first matching rule wins; evaluation order matters
//! because the rule ranges overlap. Samples matching no rule fall back to a
//! uniform-random mood, which injects a controlled amount of label noise.

use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;

use crate::types::{Mood, NUM_CLASSES};

// Column indices into the feature row, matching types::FEATURES order.
const HEART_RATE: usize = 0;
const SLEEP_ASLEEP: usize = 1;
const SLEEP_AWAKE: usize = 5;
const WORKOUT: usize = 6;
const STEPS: usize = 7;
const SCREEN_TIME: usize = 8;
const SOCIAL: usize = 9;
const OUTDOOR: usize = 10;

/// Heuristic labeler applying the ordered mood rules
pub struct HeuristicLabeler;

impl HeuristicLabeler {
    /// Apply the ordered rules to a single feature vector.
    ///
    /// Returns `None` when no rule matches. This is a pure function of the
    /// feature vector and the rule order.
    pub fn classify(row: ArrayView1<f32>) -> Option<Mood> {
        let hr = row[HEART_RATE];
        let sleep = row[SLEEP_ASLEEP];
        let awake = row[SLEEP_AWAKE];
        let workout = row[WORKOUT];
        let steps = row[STEPS];
        let screen = row[SCREEN_TIME];
        let social = row[SOCIAL];
        let outdoor = row[OUTDOOR];

        // Happy: great sleep, high steps, calm heart rate, low screen,
        // decent workout and social/outdoor time.
        if sleep >= 7.5
            && steps >= 9000.0
            && (60.0..=85.0).contains(&hr)
            && screen < 4.0
            && awake < 1.0
            && workout > 30.0
            && social > 1.5
            && outdoor > 1.5
        {
            return Some(Mood::Happy);
        }

        // Neutral: decent sleep and steps, moderate everything else.
        if sleep >= 6.5
            && steps >= 7000.0
            && (55.0..=90.0).contains(&hr)
            && screen < 6.0
            && workout > 15.0
        {
            return Some(Mood::Neutral);
        }

        // Sad: any single strong negative signal.
        if sleep < 6.0
            || steps < 5000.0
            || hr > 95.0
            || awake > 1.2
            || social < 1.0
            || outdoor < 1.0
        {
            return Some(Mood::Sad);
        }

        // Stressed: severe sleep loss, elevated heart rate, or heavy screen use.
        if sleep < 5.0 || hr > 100.0 || screen > 7.0 || workout < 10.0 || awake > 1.5 {
            return Some(Mood::Stressed);
        }

        None
    }

    /// Label one feature vector, drawing a uniform-random mood when no rule
    /// matches.
    pub fn label<R: Rng>(row: ArrayView1<f32>, rng: &mut R) -> Mood {
        match Self::classify(row) {
            Some(mood) => mood,
            None => {
                let index = rng.gen_range(0..NUM_CLASSES);
                Mood::ALL[index]
            }
        }
    }

    /// Label every row of a feature matrix in order.
    pub fn label_all<R: Rng>(features: ArrayView2<f32>, rng: &mut R) -> Vec<Mood> {
        features.outer_iter().map(|row| Self::label(row, rng)).collect()
    }
}

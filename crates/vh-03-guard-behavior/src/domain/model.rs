//! Online logistic regression
//!
//! `partial_fit` runs one SGD pass over the given observations and keeps the
//! accumulated weights, so successive passes refine the same model without
//! retraining from scratch. `samples_seen` counts distinct observations the
//! model has absorbed; replaying an observation does not count it again.

use super::memory::Observation;
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Learned predictor state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorModel {
    weights: FeatureVector,
    samples_seen: u64,
}

impl Default for BehaviorModel {
    fn default() -> Self {
        Self {
            weights: [0.0; FEATURE_COUNT],
            samples_seen: 0,
        }
    }
}

impl BehaviorModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted weights
    pub fn from_parts(weights: FeatureVector, samples_seen: u64) -> Self {
        Self {
            weights,
            samples_seen,
        }
    }

    pub fn weights(&self) -> &FeatureVector {
        &self.weights
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// All weights finite
    pub fn is_usable(&self) -> bool {
        self.weights.iter().all(|w| w.is_finite())
    }

    /// P(player succeeds | features)
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum();
        sigmoid(z)
    }

    /// One SGD pass with L2 shrinkage
    pub fn partial_fit<'a, I>(&mut self, observations: I, learning_rate: f64, l2_penalty: f64)
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        for observation in observations {
            let label = if observation.success { 1.0 } else { 0.0 };
            let error = self.predict_proba(&observation.features) - label;
            for (w, x) in self.weights.iter_mut().zip(observation.features.iter()) {
                *w -= learning_rate * (error * x + l2_penalty * *w);
            }
        }
    }

    pub fn record_samples(&mut self, count: u64) {
        self.samples_seen = self.samples_seen.saturating_add(count);
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(x: f64, success: bool) -> Observation {
        Observation {
            features: [x, 0.0, 0.0, 1.0],
            success,
        }
    }

    #[test]
    fn test_untrained_model_is_indifferent() {
        let model = BehaviorModel::new();
        assert_eq!(model.predict_proba(&[0.3, 0.7, 0.1, 1.0]), 0.5);
        assert_eq!(model.samples_seen(), 0);
    }

    #[test]
    fn test_learns_separable_pattern() {
        let mut model = BehaviorModel::new();
        let data: Vec<Observation> = (0..20)
            .flat_map(|_| [obs(0.9, true), obs(0.1, false)])
            .collect();

        for _ in 0..50 {
            model.partial_fit(&data, 0.5, 0.0);
        }

        assert!(model.predict_proba(&[0.9, 0.0, 0.0, 1.0]) > 0.6);
        assert!(model.predict_proba(&[0.1, 0.0, 0.0, 1.0]) < 0.4);
        assert_eq!(model.samples_seen(), 0);
        model.record_samples(40);
        assert_eq!(model.samples_seen(), 40);
    }

    #[test]
    fn test_successive_batches_accumulate() {
        let mut incremental = BehaviorModel::new();
        incremental.partial_fit(&[obs(0.9, true)], 0.1, 0.0);
        incremental.partial_fit(&[obs(0.1, false)], 0.1, 0.0);

        let mut single = BehaviorModel::new();
        single.partial_fit(&[obs(0.9, true), obs(0.1, false)], 0.1, 0.0);

        assert_eq!(incremental, single);
    }

    #[test]
    fn test_non_finite_weights_detected() {
        let model = BehaviorModel::from_parts([f64::NAN, 0.0, 0.0, 0.0], 100);
        assert!(!model.is_usable());
        assert!(BehaviorModel::new().is_usable());
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }
}

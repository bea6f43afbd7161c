//! Binary multinomial Naive Bayes over tf-idf rows.
//!
//! One estimator answers "does this label apply?" for a single label. The
//! probability of the positive class is `sigmoid(jll_pos - jll_neg)` where
//! `jll_c = ln P(c) + Σ x_j · ln P(feature_j | c)`.

use super::vectorizer::SparseVector;
use crate::error::TrainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryNaiveBayes {
    /// `[negative, positive]` log priors.
    class_log_prior: [f64; 2],
    /// Per class, log probability of each feature.
    feature_log_prob: [Vec<f64>; 2],
}

impl BinaryNaiveBayes {
    /// Fit on rows with a positive/negative target each. Both classes must
    /// be present; see [`LabelEstimator::fit`] for the constant case.
    pub fn fit(
        rows: &[SparseVector],
        targets: &[bool],
        n_features: usize,
        alpha: f64,
    ) -> Result<Self, TrainError> {
        if alpha <= 0.0 || !alpha.is_finite() {
            return Err(TrainError::InvalidParameter(format!(
                "alpha {alpha} must be positive"
            )));
        }
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(TrainError::NoSamples);
        }

        let mut class_count = [0.0f64; 2];
        let mut feature_count = [vec![0.0f64; n_features], vec![0.0f64; n_features]];
        for (row, &positive) in rows.iter().zip(targets) {
            let c = usize::from(positive);
            class_count[c] += 1.0;
            for &(idx, weight) in row {
                feature_count[c][idx] += weight;
            }
        }

        let n = rows.len() as f64;
        let class_log_prior = [(class_count[0] / n).ln(), (class_count[1] / n).ln()];
        let feature_log_prob = feature_count.map(|counts| {
            let total: f64 = counts.iter().sum::<f64>() + alpha * n_features as f64;
            counts
                .into_iter()
                .map(|count| ((count + alpha) / total).ln())
                .collect::<Vec<f64>>()
        });

        Ok(Self {
            class_log_prior,
            feature_log_prob,
        })
    }

    pub fn predict_positive(&self, row: &SparseVector) -> f64 {
        let jll = |c: usize| {
            self.class_log_prior[c]
                + row
                    .iter()
                    .map(|&(idx, weight)| weight * self.feature_log_prob[c][idx])
                    .sum::<f64>()
        };
        sigmoid(jll(1) - jll(0))
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Per-label estimator of a one-vs-rest model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelEstimator {
    /// The label was always (1.0) or never (0.0) present in training.
    Constant(f64),
    NaiveBayes(BinaryNaiveBayes),
}

impl LabelEstimator {
    pub fn fit(
        rows: &[SparseVector],
        targets: &[bool],
        n_features: usize,
        alpha: f64,
    ) -> Result<Self, TrainError> {
        if targets.iter().all(|&t| t) {
            return Ok(LabelEstimator::Constant(1.0));
        }
        if targets.iter().all(|&t| !t) {
            return Ok(LabelEstimator::Constant(0.0));
        }
        BinaryNaiveBayes::fit(rows, targets, n_features, alpha).map(LabelEstimator::NaiveBayes)
    }

    pub fn predict(&self, row: &SparseVector) -> f64 {
        match self {
            LabelEstimator::Constant(p) => *p,
            LabelEstimator::NaiveBayes(nb) => nb.predict_positive(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separable_features() {
        // feature 0 only in positives, feature 1 only in negatives
        let rows = vec![
            vec![(0, 1.0)],
            vec![(0, 0.8), (2, 0.6)],
            vec![(1, 1.0)],
            vec![(1, 0.6), (2, 0.8)],
        ];
        let targets = [true, true, false, false];
        let nb = BinaryNaiveBayes::fit(&rows, &targets, 3, 0.1).unwrap();
        assert!(nb.predict_positive(&vec![(0, 1.0)]) > 0.9);
        assert!(nb.predict_positive(&vec![(1, 1.0)]) < 0.1);
        let neutral = nb.predict_positive(&vec![]);
        assert!((neutral - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_prior_drives_empty_rows() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(1, 1.0)], vec![(1, 1.0)]];
        let targets = [true, false, false, false];
        let nb = BinaryNaiveBayes::fit(&rows, &targets, 2, 0.1).unwrap();
        assert!((nb.predict_positive(&vec![]) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_constant_columns() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)]];
        assert_eq!(
            LabelEstimator::fit(&rows, &[true, true], 2, 0.1).unwrap(),
            LabelEstimator::Constant(1.0)
        );
        let never = LabelEstimator::fit(&rows, &[false, false], 2, 0.1).unwrap();
        assert_eq!(never.predict(&vec![(0, 1.0)]), 0.0);
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)]];
        assert!(BinaryNaiveBayes::fit(&rows, &[true, false], 2, 0.0).is_err());
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }
}

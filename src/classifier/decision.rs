//! Threshold policy turning per-label probabilities into a label set.

use crate::models::{PredictionResult, ScoredLabel};
use serde::Serialize;
use std::fmt;

/// Probability cutoff in `[0.01, 0.99]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(0.30);
    pub const MIN: f64 = 0.01;
    pub const MAX: f64 = 0.99;

    /// `None` when `value` is outside `[MIN, MAX]` or not a number.
    pub fn new(value: f64) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Threshold(value))
    }

    /// Interpret user input as a percentage (`"30"` → 0.30). Empty,
    /// unparsable and out-of-range input (outside 1–99) yields `fallback`.
    pub fn from_percent_str(raw: &str, fallback: Threshold) -> Self {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|p| (1.0..=99.0).contains(p))
            .and_then(|p| Threshold::new(p / 100.0))
            .unwrap_or(fallback)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn percent(self) -> f64 {
        (self.0 * 10_000.0).round() / 100.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Labels chosen for one input. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedLabels {
    labels: Vec<ScoredLabel>,
    /// True when no label reached the threshold and the single most probable
    /// label was taken instead. Such a label can look confident while the
    /// model is not.
    below_threshold: bool,
}

impl SelectedLabels {
    /// Selected labels in canonical label order. Never empty.
    pub fn labels(&self) -> &[ScoredLabel] {
        &self.labels
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.label.as_str())
    }

    /// Whether the selection is the arg-max fallback rather than labels
    /// that reached the threshold.
    pub fn is_fallback(&self) -> bool {
        self.below_threshold
    }

    /// Labels ordered by descending probability, for display.
    pub fn by_confidence(&self) -> Vec<&ScoredLabel> {
        let mut sorted: Vec<&ScoredLabel> = self.labels.iter().collect();
        sorted.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        sorted
    }
}

/// Apply the threshold policy to one prediction.
///
/// # Arguments
/// * `prediction` - Per-label probabilities in canonical label order
/// * `threshold` - Minimum probability for a label to be selected
///
/// # Returns
/// * `Option<SelectedLabels>` - Every label with probability ≥ `threshold`,
///   in canonical order; if there is none, exactly the arg-max label. `None`
///   only for an empty prediction.
pub fn select_labels(prediction: &PredictionResult, threshold: Threshold) -> Option<SelectedLabels> {
    let passing: Vec<ScoredLabel> = prediction
        .scores
        .iter()
        .filter(|s| s.probability >= threshold.value())
        .cloned()
        .collect();
    if !passing.is_empty() {
        return Some(SelectedLabels {
            labels: passing,
            below_threshold: false,
        });
    }
    prediction.argmax().map(|best| SelectedLabels {
        labels: vec![best.clone()],
        below_threshold: true,
    })
}

//! Plain-text reports printed by the command-line front end.

use crate::classifier::{SelectedLabels, Threshold};
use crate::models::PredictionResult;
use crate::pipeline::Classification;
use crate::utils::format_percent;
use itertools::Itertools;
use std::collections::BTreeMap;

const FALLBACK_NOTE: &str =
    "  (no label reached the threshold; showing the most probable label)";

/// Selected labels of one title, most confident first.
pub fn render_selection(title: &str, selected: &SelectedLabels, threshold: Threshold) -> String {
    let mut out = format!("{title}\n");
    out.push_str(&label_lines(selected));
    if selected.is_fallback() {
        out.push_str(&format!("{FALLBACK_NOTE} [threshold {threshold}]\n"));
    }
    out
}

/// Full result of a single-URL request, including every label's score.
pub fn render_classification(result: &Classification) -> String {
    let mut out = String::new();
    out.push_str(&format!("URL:       {}\n", result.url));
    out.push_str(&format!("Title:     {}\n", result.title));
    out.push_str(&format!(
        "Model:     {}   Threshold: {}\n",
        result.model.display_name(),
        result.threshold
    ));
    out.push_str("Labels:\n");
    out.push_str(&label_lines(&result.selected));
    if result.selected.is_fallback() {
        out.push_str(FALLBACK_NOTE);
        out.push('\n');
    }
    out.push_str("All probabilities:\n");
    out.push_str(&probability_lines(&result.prediction));
    out
}

/// Label counts, most frequent first, ties alphabetical.
pub fn render_tag_counts(counts: &BTreeMap<String, usize>) -> String {
    let width = counts.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let total: usize = counts.values().sum();
    let mut out: String = counts
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(label, count)| format!("  {label:<width$}  {count:>6}\n"))
        .collect();
    out.push_str(&format!("  {:<width$}  {total:>6}\n", "total"));
    out
}

fn label_lines(selected: &SelectedLabels) -> String {
    selected
        .by_confidence()
        .into_iter()
        .map(|l| format!("  {:<14} {:>8}\n", l.label, format_percent(l.probability)))
        .collect()
}

fn probability_lines(prediction: &PredictionResult) -> String {
    prediction
        .scores
        .iter()
        .sorted_by(|a, b| b.probability.total_cmp(&a.probability))
        .map(|s| format!("  {:<14} {:>8}\n", s.label, format_percent(s.probability)))
        .collect()
}

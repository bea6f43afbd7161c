//! Data models shared by the scraper, the classifier and the front ends.
//!
//! - [`FetchedDocument`]: raw markup of one retrieved page
//! - [`ExtractedTitle`]: best-effort page title or an explicit "not found"
//! - [`LabelSet`]: closed topic vocabulary of a trained model
//! - [`PredictionResult`]: per-label probabilities for one input
//! - [`DatasetEntry`]: one scraped, tagged article as stored in `data.json`
//!
//! Everything except the dataset lives for a single request only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Markup of a page as returned by the fetch layer.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final URL after redirects.
    pub url: Url,
    /// Markup decoded with the announced charset, UTF-8 when absent.
    pub body: String,
}

/// Result of the title fallback chain. Extraction never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedTitle {
    Found(String),
    NotFound,
}

/// The fixed, sorted topic vocabulary of a trained model.
///
/// Positions in the set are the index space of prediction scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    /// Build from any label collection; duplicates are removed and the
    /// result is sorted so the canonical order is stable across runs.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        labels.dedup();
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One label with the probability that it applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub label: String,
    pub probability: f64,
}

/// Per-label probabilities for every label of a [`LabelSet`], in canonical
/// label order. Scores are independent and need not sum to one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub scores: Vec<ScoredLabel>,
}

impl PredictionResult {
    /// Highest-probability label; ties go to the first in canonical order.
    pub fn argmax(&self) -> Option<&ScoredLabel> {
        self.scores.iter().fold(None, |best, candidate| match best {
            Some(b) if b.probability >= candidate.probability => Some(b),
            _ => Some(candidate),
        })
    }
}

/// A scraped article as stored in `data.json`, keyed by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub title: String,
    /// Comma separated tags as entered by annotators.
    #[serde(default)]
    pub tag: String,
    /// First words of the article body, when scraped with content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// URL → entry, ordered by URL for reproducible output files.
pub type Dataset = BTreeMap<String, DatasetEntry>;

/// One training example: raw text and its canonical labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSample {
    pub text: String,
    pub labels: Vec<String>,
}

impl TrainingSample {
    pub fn new(text: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            text: text.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

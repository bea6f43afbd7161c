//! TF-IDF bag-of-n-grams features.
//!
//! Terms are contiguous runs of 1..=`max_n` tokens, where a token is a
//! `\b\w\w+\b` match of the normalized text, so single characters and
//! punctuation never become features.

use crate::error::TrainError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Sparse row: `(feature index, weight)` sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizerParams {
    pub min_n: usize,
    pub max_n: usize,
    /// `1 + ln(tf)` instead of raw counts.
    pub sublinear_tf: bool,
    /// Terms seen in fewer documents are dropped.
    pub min_df: usize,
    /// Terms seen in a larger share of documents are dropped.
    pub max_df: f64,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            min_n: 1,
            max_n: 2,
            sublinear_tf: true,
            min_df: 1,
            max_df: 0.8,
        }
    }
}

impl VectorizerParams {
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.min_n == 0 || self.min_n > self.max_n {
            return Err(TrainError::InvalidParameter(format!(
                "n-gram range ({}, {}) is empty",
                self.min_n, self.max_n
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(TrainError::InvalidParameter(format!(
                "max_df {} is outside (0, 1]",
                self.max_df
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    params: VectorizerParams,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and idf weights from normalized documents.
    pub fn fit(documents: &[String], params: VectorizerParams) -> Result<Self, TrainError> {
        params.validate()?;
        let n_docs = documents.len();
        if n_docs == 0 {
            return Err(TrainError::NoSamples);
        }

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = terms(doc, &params).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = params.max_df * n_docs as f64;
        let kept: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= params.min_df && (*df as f64) <= max_doc_count)
            .collect();
        if kept.is_empty() {
            return Err(TrainError::EmptyVocabulary);
        }

        // BTreeMap iteration keeps the vocabulary in sorted term order.
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (idx, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        Ok(Self {
            params,
            vocabulary,
            idf,
        })
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized tf-idf row for one normalized document. Terms outside
    /// the vocabulary are ignored; a document with none yields an empty row.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms(document, &self.params) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.params.sublinear_tf {
                    1.0 + tf.ln()
                } else {
                    tf
                };
                (idx, tf * self.idf[idx])
            })
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }
}

fn terms(document: &str, params: &VectorizerParams) -> Vec<String> {
    let tokens: Vec<&str> = TERM_RE.find_iter(document).map(|m| m.as_str()).collect();
    let mut out = Vec::new();
    for n in params.min_n..=params.max_n {
        if n > tokens.len() {
            break;
        }
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_terms_unigrams_and_bigrams() {
        let t = terms("ca_sĩ lộ clip , a", &VectorizerParams::default());
        assert_eq!(t, vec!["ca_sĩ", "lộ", "clip", "ca_sĩ lộ", "lộ clip"]);
    }

    #[test]
    fn test_max_df_prunes_ubiquitous_terms() {
        let params = VectorizerParams::default();
        let v = TfidfVectorizer::fit(&docs(&["về ca_sĩ", "về học_sinh", "về đầu_tư"]), params)
            .unwrap();
        assert!(!v.vocabulary.contains_key("về"));
        assert!(v.vocabulary.contains_key("ca_sĩ"));
        assert!(v.vocabulary.contains_key("về ca_sĩ"));
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let v = TfidfVectorizer::fit(&docs(&["beta alpha", "gamma"]), VectorizerParams::default())
            .unwrap();
        let mut by_index: Vec<(&String, &usize)> = v.vocabulary.iter().collect();
        by_index.sort_by_key(|(_, idx)| **idx);
        let names: Vec<&str> = by_index.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "beta alpha", "gamma"]);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let v = TfidfVectorizer::fit(
            &docs(&["ca_sĩ lộ clip", "học_sinh lộ đề", "đầu_tư cổ_phiếu"]),
            VectorizerParams::default(),
        )
        .unwrap();
        let row = v.transform("ca_sĩ lộ clip lộ");
        let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert!(v.transform("hoàn toàn mới").is_empty());
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        let err = TfidfVectorizer::fit(&docs(&["a , b"]), VectorizerParams::default()).unwrap_err();
        assert_eq!(err, TrainError::EmptyVocabulary);
        let err = TfidfVectorizer::fit(&[], VectorizerParams::default()).unwrap_err();
        assert_eq!(err, TrainError::NoSamples);
    }

    #[test]
    fn test_invalid_params() {
        let params = VectorizerParams {
            max_df: 1.5,
            ..VectorizerParams::default()
        };
        assert!(matches!(
            TfidfVectorizer::fit(&docs(&["x y"]), params),
            Err(TrainError::InvalidParameter(_))
        ));
    }
}

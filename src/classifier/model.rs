//! One-vs-rest topic model: text normalizer, tf-idf features and one
//! Naive Bayes estimator per label, persisted together as one opaque file.

use super::naive_bayes::LabelEstimator;
use super::vectorizer::{TfidfVectorizer, VectorizerParams};
use crate::error::{ModelError, PredictionError, TrainError};
use crate::models::{LabelSet, PredictionResult, ScoredLabel, TrainingSample};
use crate::text::TextNormalizer;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub vectorizer: VectorizerParams,
    /// Additive smoothing of the Naive Bayes feature counts.
    pub alpha: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerParams::default(),
            alpha: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    labels: LabelSet,
    normalizer: TextNormalizer,
    vectorizer: TfidfVectorizer,
    /// Parallel to `labels`.
    estimators: Vec<LabelEstimator>,
    trained_at: String,
    n_samples: usize,
}

impl TopicModel {
    /// Train on raw samples. Every sample is normalized with `normalizer`,
    /// which is stored in the model and reused by [`TopicModel::classify`].
    ///
    /// # Arguments
    /// * `samples` - Raw texts with their canonical labels
    /// * `normalizer` - Segmenter applied to every text, now and at inference
    /// * `params` - Vectorizer settings and Naive Bayes smoothing
    ///
    /// # Returns
    /// * `Result<TopicModel, TrainError>` - Fails on an empty sample set,
    ///   invalid parameters or a vocabulary pruned to nothing
    #[instrument(level = "info", skip_all, fields(samples = samples.len()))]
    pub fn train(
        samples: &[TrainingSample],
        normalizer: TextNormalizer,
        params: TrainingParams,
    ) -> Result<Self, TrainError> {
        if samples.is_empty() {
            return Err(TrainError::NoSamples);
        }
        let labels = LabelSet::new(samples.iter().flat_map(|s| s.labels.iter().cloned()));
        if labels.is_empty() {
            return Err(TrainError::NoLabels);
        }

        let documents: Vec<String> = samples
            .iter()
            .map(|s| normalizer.normalize(&s.text))
            .collect();
        let vectorizer = TfidfVectorizer::fit(&documents, params.vectorizer)?;
        let rows: Vec<_> = documents.iter().map(|d| vectorizer.transform(d)).collect();

        let estimators = labels
            .iter()
            .map(|label| -> Result<LabelEstimator, TrainError> {
                let targets: Vec<bool> = samples
                    .iter()
                    .map(|s| s.labels.iter().any(|l| l == label))
                    .collect();
                let estimator =
                    LabelEstimator::fit(&rows, &targets, vectorizer.n_features(), params.alpha)?;
                debug!(
                    label,
                    positives = targets.iter().filter(|t| **t).count(),
                    "Fitted label estimator"
                );
                Ok(estimator)
            })
            .collect::<Result<Vec<_>, TrainError>>()?;

        info!(
            labels = labels.len(),
            features = vectorizer.n_features(),
            "Trained topic model"
        );
        Ok(Self {
            labels,
            normalizer,
            vectorizer,
            estimators,
            trained_at: Utc::now().to_rfc3339(),
            n_samples: samples.len(),
        })
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// The normalizer the model was trained with.
    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn trained_at(&self) -> &str {
        &self.trained_at
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }

    /// Per-label probabilities for already normalized text.
    pub fn predict(&self, normalized: &str) -> Result<PredictionResult, PredictionError> {
        if normalized.trim().is_empty() {
            return Err(PredictionError::EmptyInput);
        }
        let row = self.vectorizer.transform(normalized);
        let scores = self
            .labels
            .iter()
            .zip(&self.estimators)
            .map(|(label, estimator)| {
                let probability = estimator.predict(&row);
                if !probability.is_finite() {
                    return Err(PredictionError::NonFinite(label.to_string()));
                }
                Ok(ScoredLabel {
                    label: label.to_string(),
                    probability,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PredictionResult { scores })
    }

    /// Normalize a raw title with the model's own normalizer, then predict.
    pub fn classify(&self, title: &str) -> Result<PredictionResult, PredictionError> {
        self.predict(&self.normalizer.normalize(title))
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        std::fs::write(path, &bytes).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(bytes = bytes.len(), "Saved model");
        Ok(())
    }

    /// Read a model written by [`TopicModel::save`].
    ///
    /// # Arguments
    /// * `path` - Model file
    ///
    /// # Returns
    /// * `Result<TopicModel, ModelError>` - `Io` when unreadable, `Decode`
    ///   when the bytes are not a model
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (model, _): (TopicModel, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).map_err(
                |source| ModelError::Decode {
                    path: path.to_path_buf(),
                    source,
                },
            )?;
        info!(
            labels = model.labels.len(),
            features = model.n_features(),
            trained_at = %model.trained_at,
            "Loaded model"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::decision::{Threshold, select_labels};
    use crate::dataset::keyword_samples;

    fn keyword_model() -> TopicModel {
        TopicModel::train(
            &keyword_samples(),
            TextNormalizer::vietnamese(),
            TrainingParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_regression_fixture_selects_entertainment() {
        let model = keyword_model();
        let prediction = model.classify("Ca sĩ lộ clip với học sinh").unwrap();
        let selected = select_labels(&prediction, Threshold::DEFAULT).unwrap();
        assert!(
            selected.names().any(|l| l == "giải trí"),
            "selected: {:?}",
            selected
        );
    }

    #[test]
    fn test_predicts_every_label_in_canonical_order() {
        let model = keyword_model();
        let prediction = model.classify("Bắt tạm giam nhóm đối tượng lừa đảo").unwrap();
        let names: Vec<&str> = prediction.scores.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(names, model.labels().iter().collect::<Vec<_>>());
        assert_eq!(names, vec!["công nghệ", "giáo dục", "giải trí", "kinh doanh"]);
        assert!(
            prediction
                .scores
                .iter()
                .all(|s| (0.0..=1.0).contains(&s.probability))
        );
        let best = prediction.argmax().unwrap();
        assert_eq!(best.label, "kinh doanh");
    }

    #[test]
    fn test_classify_uses_training_normalizer() {
        let model = keyword_model();
        let title = "Giáo viên bị phụ huynh quây kín";
        assert_eq!(model.normalizer(), &TextNormalizer::vietnamese());
        assert_eq!(
            model.classify(title).unwrap(),
            model.predict(&model.normalizer().normalize(title)).unwrap()
        );
    }

    #[test]
    fn test_empty_input_is_prediction_error() {
        let model = keyword_model();
        assert_eq!(model.predict("   "), Err(PredictionError::EmptyInput));
    }

    #[test]
    fn test_train_rejects_unlabeled_samples() {
        let samples = vec![TrainingSample::new("vấn đề", &[])];
        assert_eq!(
            TopicModel::train(&samples, TextNormalizer::vietnamese(), TrainingParams::default()),
            Err(TrainError::NoLabels)
        );
        assert_eq!(
            TopicModel::train(&[], TextNormalizer::vietnamese(), TrainingParams::default()),
            Err(TrainError::NoSamples)
        );
    }

    #[test]
    fn test_save_and_load_preserve_predictions() {
        let model = keyword_model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_nb.bin");
        model.save(&path).unwrap();
        let loaded = TopicModel::load(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_load_errors_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            TopicModel::load(&missing),
            Err(ModelError::Io { .. })
        ));
        let garbage = dir.path().join("garbage.bin");
        std::fs::write(&garbage, b"not a model").unwrap();
        assert!(matches!(
            TopicModel::load(&garbage),
            Err(ModelError::Decode { .. })
        ));
    }
}

//! Model selectors and the set of models loaded at start-up.

use super::model::TopicModel;
use crate::error::{ClassifyError, ModelError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Which trained model a request wants. Resolved once at the boundary; the
/// pipeline never compares selector strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
pub enum ModelKind {
    /// Bag-of-n-grams Naive Bayes over titles.
    #[serde(rename = "nb")]
    #[value(name = "nb")]
    NaiveBayes,
    /// Slot for a sequence model trained elsewhere and exported in the same
    /// model file format.
    #[serde(rename = "rnn")]
    #[value(name = "rnn")]
    Recurrent,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::NaiveBayes, ModelKind::Recurrent];

    pub fn selector(self) -> &'static str {
        match self {
            ModelKind::NaiveBayes => "nb",
            ModelKind::Recurrent => "rnn",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::NaiveBayes => "Naive Bayes",
            ModelKind::Recurrent => "RNN",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for ModelKind {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.selector() == wanted)
            .ok_or_else(|| ClassifyError::UnknownModel(s.trim().to_string()))
    }
}

/// Read-only models, loaded once and shared by every request.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<ModelKind, TopicModel>,
}

impl ModelRegistry {
    /// Load every configured model file. Any configured file that cannot be
    /// loaded is fatal; kinds without a configured file stay unavailable.
    pub fn load(paths: &BTreeMap<ModelKind, PathBuf>) -> Result<Self, ModelError> {
        let mut models = HashMap::new();
        for (kind, path) in paths {
            let model = TopicModel::load(path)?;
            info!(%kind, path = %path.display(), "Registered model");
            models.insert(*kind, model);
        }
        for kind in ModelKind::ALL {
            if !models.contains_key(&kind) {
                warn!(%kind, "No model file configured; selector unavailable");
            }
        }
        Ok(Self { models })
    }

    pub fn from_models(models: impl IntoIterator<Item = (ModelKind, TopicModel)>) -> Self {
        Self {
            models: models.into_iter().collect(),
        }
    }

    pub fn get(&self, kind: ModelKind) -> Result<&TopicModel, ClassifyError> {
        self.models
            .get(&kind)
            .ok_or(ClassifyError::ModelUnavailable(kind))
    }

    pub fn is_available(&self, kind: ModelKind) -> bool {
        self.models.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::model::TrainingParams;
    use crate::models::TrainingSample;
    use crate::text::TextNormalizer;

    fn tiny_model() -> TopicModel {
        let samples = vec![
            TrainingSample::new("ca sĩ hát", &["giải trí"]),
            TrainingSample::new("học sinh thi", &["giáo dục"]),
            TrainingSample::new("cổ phiếu giảm", &["kinh doanh"]),
        ];
        TopicModel::train(&samples, TextNormalizer::vietnamese(), TrainingParams::default())
            .unwrap()
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("nb".parse::<ModelKind>().unwrap(), ModelKind::NaiveBayes);
        assert_eq!(" RNN ".parse::<ModelKind>().unwrap(), ModelKind::Recurrent);
        assert!(matches!(
            "svm".parse::<ModelKind>(),
            Err(ClassifyError::UnknownModel(name)) if name == "svm"
        ));
    }

    #[test]
    fn test_missing_kind_is_unavailable() {
        let registry = ModelRegistry::from_models([(ModelKind::NaiveBayes, tiny_model())]);
        assert!(registry.get(ModelKind::NaiveBayes).is_ok());
        assert!(registry.is_available(ModelKind::NaiveBayes));
        assert!(matches!(
            registry.get(ModelKind::Recurrent),
            Err(ClassifyError::ModelUnavailable(ModelKind::Recurrent))
        ));
    }

    #[test]
    fn test_load_from_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.bin");
        tiny_model().save(&path).unwrap();

        let mut paths = BTreeMap::new();
        paths.insert(ModelKind::NaiveBayes, path);
        let registry = ModelRegistry::load(&paths).unwrap();
        assert!(registry.is_available(ModelKind::NaiveBayes));
        assert!(!registry.is_available(ModelKind::Recurrent));

        paths.insert(ModelKind::Recurrent, dir.path().join("missing.bin"));
        assert!(ModelRegistry::load(&paths).is_err());
    }

    #[test]
    fn test_serde_selector_names() {
        let yaml = "nb: a.bin\nrnn: b.bin\n";
        let parsed: BTreeMap<ModelKind, PathBuf> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed[&ModelKind::NaiveBayes], PathBuf::from("a.bin"));
        assert_eq!(parsed[&ModelKind::Recurrent], PathBuf::from("b.bin"));
    }
}

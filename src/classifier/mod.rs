//! Multi-label topic classifier.
//!
//! Articles often carry several topics at once ("giải trí" and "giáo dục"),
//! so each label gets its own binary estimator over a shared tf-idf feature
//! vector (one-vs-rest) and a threshold policy picks the final label set.
//!
//! - [`vectorizer`]: unigram+bigram tf-idf features
//! - [`naive_bayes`]: per-label binary multinomial Naive Bayes
//! - [`model`]: training, inference and persistence of a [`TopicModel`]
//! - [`decision`]: [`Threshold`] and the never-empty label selection
//! - [`registry`]: [`ModelKind`] selectors and the models loaded at start-up

pub mod decision;
pub mod model;
pub mod naive_bayes;
pub mod registry;
pub mod vectorizer;

pub use decision::{SelectedLabels, Threshold, select_labels};
pub use model::{TopicModel, TrainingParams};
pub use registry::{ModelKind, ModelRegistry};

//! Error types for every stage of the tagging pipeline.
//!
//! Each concern owns a small enum. [`ClassifyError`] is the request-level
//! error: it wraps the stage errors and knows how to reduce itself to a
//! message that can be shown to an end user.

use crate::classifier::registry::ModelKind;
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

/// A submitted URL was rejected before any network call was issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter an article URL")]
    Empty,
    #[error("only http and https URLs are supported (got {0:?})")]
    UnsupportedScheme(String),
    #[error("URL could not be parsed: {0}")]
    Malformed(String),
    #[error("URL has no host name")]
    MissingHost,
    #[error("host 'localhost' is not reachable on the public internet")]
    Localhost,
    #[error("'.local' domains are internal and not reachable on the public internet")]
    LocalDomain,
    #[error("host name contains invalid characters")]
    InvalidHostCharacters,
    #[error("address {0} is not public (private, loopback or link-local)")]
    NonPublicAddress(IpAddr),
    #[error("domain must be a public name such as vnexpress.net")]
    NotPublicDomain,
    #[error("domain could not be resolved: {0}")]
    Unresolvable(String),
    #[error("domain resolves to a non-public address")]
    ResolvesToNonPublic,
}

/// A page fetch failed. No variant is ever retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out while fetching the page")]
    Timeout,
    #[error("DNS lookup failed: {0}")]
    Dns(String),
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },
    #[error("TLS error: {0}")]
    Tls(String),
    /// The host, or a redirect target, is not on the public internet.
    #[error("refused to connect: {0}")]
    NonPublicTarget(String),
    #[error("request failed: {0}")]
    Unknown(String),
}

/// The statistical pipeline refused an input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("input text is empty")]
    EmptyInput,
    #[error("model produced a non-finite score for label {0:?}")]
    NonFinite(String),
}

/// Loading or saving a model file failed.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode model: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("model file {path} is not a valid model: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::error::DecodeError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainError {
    #[error("no training samples")]
    NoSamples,
    #[error("training samples carry no labels")]
    NoLabels,
    #[error("after pruning, no terms remain; lower min_df or raise max_df")]
    EmptyVocabulary,
    #[error("invalid training parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Terminal failure of one classification request.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no title found on the page")]
    ExtractionEmpty,
    #[error("model {0} is not loaded")]
    ModelUnavailable(ModelKind),
    #[error("unknown model type {0:?}")]
    UnknownModel(String),
    #[error("prediction with model {kind} failed: {source}")]
    Prediction {
        kind: ModelKind,
        #[source]
        source: PredictionError,
    },
}

impl ClassifyError {
    /// Explanatory message for the end user. Never exposes a raw fault.
    pub fn user_message(&self) -> String {
        match self {
            ClassifyError::Validation(e) => format!("Invalid URL: {e}."),
            ClassifyError::Fetch(e) => {
                format!("Could not fetch a title from the URL: {}", fetch_reason(e))
            }
            ClassifyError::ExtractionEmpty => {
                "No title was found on this page. Check the link or try another one.".to_string()
            }
            ClassifyError::ModelUnavailable(kind) => format!(
                "The {} model is not loaded. Train it and configure its model file first.",
                kind.display_name()
            ),
            ClassifyError::UnknownModel(name) => format!("Unknown model type: {name}"),
            ClassifyError::Prediction { kind, source } => format!(
                "Prediction with the {} model failed: {source}",
                kind.display_name()
            ),
        }
    }
}

fn fetch_reason(e: &FetchError) -> String {
    match e {
        FetchError::Timeout => "the site took too long to respond.".to_string(),
        FetchError::Dns(_) => "the domain name could not be resolved.".to_string(),
        FetchError::Http { status, reason } if reason.is_empty() => format!("HTTP {status}."),
        FetchError::Http { status, reason } => format!("{reason} (HTTP {status})."),
        FetchError::Tls(detail) => format!("secure connection failed ({detail})."),
        FetchError::NonPublicTarget(_) => {
            "the page or one of its redirects points at a non-public address.".to_string()
        }
        FetchError::Unknown(detail) => format!("{detail}."),
    }
}

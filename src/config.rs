//! Runtime settings.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags or their environment variables. Every field has a
//! default, so the file may be partial or absent:
//!
//! ```yaml
//! threshold: 0.30
//! fetch_timeout_secs: 10
//! dns_timeout_secs: 3
//! bind: 127.0.0.1:5000
//! models:
//!   nb: model_nb.bin
//!   rnn: model_rnn.bin
//! lexicon_path: lexicon.txt
//! ```

use crate::classifier::{ModelKind, Threshold};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default probability cutoff, in `[0.01, 0.99]`.
    pub threshold: f64,
    pub fetch_timeout_secs: u64,
    pub dns_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// Address the web form listens on.
    pub bind: SocketAddr,
    /// Model file per selector. Selectors without a file are unavailable.
    pub models: BTreeMap<ModelKind, PathBuf>,
    /// Extra segmentation phrases, one per line.
    pub lexicon_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(ModelKind::NaiveBayes, PathBuf::from("model_nb.bin"));
        Self {
            threshold: Threshold::DEFAULT.value(),
            fetch_timeout_secs: 10,
            dns_timeout_secs: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            models,
            lexicon_path: None,
        }
    }
}

/// Values supplied on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Percent, as typed by the user (`"30"`).
    pub threshold_percent: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub bind: Option<SocketAddr>,
    pub models: Vec<(ModelKind, PathBuf)>,
    pub lexicon_path: Option<PathBuf>,
}

impl Settings {
    /// Load from `path` when given, otherwise start from defaults.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let parsed: Settings =
                    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!(path = %path.display(), "Loaded configuration");
                parsed
            }
            None => {
                debug!("No config file given; using defaults");
                Settings::default()
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(raw) = overrides.threshold_percent {
            self.threshold = Threshold::from_percent_str(&raw, self.default_threshold()).value();
        }
        if let Some(secs) = overrides.fetch_timeout_secs {
            self.fetch_timeout_secs = secs;
        }
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        self.models.extend(overrides.models);
        if overrides.lexicon_path.is_some() {
            self.lexicon_path = overrides.lexicon_path;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Threshold::new(self.threshold).is_none() {
            return Err(ConfigError::Invalid(format!(
                "threshold {} is outside [{}, {}]",
                self.threshold,
                Threshold::MIN,
                Threshold::MAX
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch_timeout_secs must be > 0".into()));
        }
        if self.dns_timeout_secs == 0 {
            return Err(ConfigError::Invalid("dns_timeout_secs must be > 0".into()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".into()));
        }
        Ok(())
    }

    /// The validated default threshold.
    pub fn default_threshold(&self) -> Threshold {
        Threshold::new(self.threshold).unwrap_or_default()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }
}

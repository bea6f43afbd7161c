//! Single-URL classification: validate → fetch → extract → normalize →
//! predict → select.
//!
//! [`AppContext`] bundles everything a request needs and is built once at
//! start-up. It is immutable afterwards and shared by reference (or `Arc`)
//! between requests.

use crate::classifier::{ModelKind, ModelRegistry, SelectedLabels, Threshold, select_labels};
use crate::config::Settings;
use crate::error::{ClassifyError, PredictionError};
use crate::models::{ExtractedTitle, PredictionResult};
use crate::scrapers::title::extract_title_from_markup;
use crate::scrapers::{PageFetcher, PageSource};
use crate::utils::truncate_for_log;
use crate::validate::{HostResolver, SystemResolver, validate_public_url};
use serde::Serialize;
use std::error::Error;
use tracing::{info, instrument, warn};

/// One classification request as submitted by a front end.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub url: String,
    pub model: ModelKind,
    /// `None` uses the configured default.
    pub threshold: Option<Threshold>,
}

/// Outcome of a successful request.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// Normalized URL that was fetched.
    pub url: String,
    pub title: String,
    pub model: ModelKind,
    pub threshold: Threshold,
    /// Every label's probability, in canonical order.
    pub prediction: PredictionResult,
    pub selected: SelectedLabels,
}

pub struct AppContext<R = SystemResolver, F = PageFetcher> {
    settings: Settings,
    registry: ModelRegistry,
    resolver: R,
    fetcher: F,
}

impl AppContext {
    /// Production context: load every configured model and build the
    /// system resolver and HTTP fetcher from `settings`.
    #[instrument(level = "info", skip_all)]
    pub fn from_settings(settings: Settings) -> Result<Self, Box<dyn Error>> {
        let registry = ModelRegistry::load(&settings.models)?;
        let fetcher = PageFetcher::from_settings(&settings)?;
        let resolver = SystemResolver::new(settings.dns_timeout());
        Ok(Self::new(settings, registry, resolver, fetcher))
    }
}

impl<R: HostResolver, F: PageSource> AppContext<R, F> {
    pub fn new(settings: Settings, registry: ModelRegistry, resolver: R, fetcher: F) -> Self {
        Self {
            settings,
            registry,
            resolver,
            fetcher,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run the whole pipeline once. Every failure is terminal for the
    /// request and nothing is retried.
    #[instrument(level = "info", skip_all, fields(url = %truncate_for_log(request.url.trim(), 200), model = %request.model))]
    pub async fn classify_url(
        &self,
        request: &ClassifyRequest,
    ) -> Result<Classification, ClassifyError> {
        let model = self.registry.get(request.model)?;
        let threshold = request
            .threshold
            .unwrap_or_else(|| self.settings.default_threshold());

        let url = validate_public_url(&request.url, &self.resolver).await?;
        let page = self.fetcher.fetch(&url).await?;

        let title = match extract_title_from_markup(&page.body) {
            ExtractedTitle::Found(title) => title,
            ExtractedTitle::NotFound => {
                warn!(final_url = %page.url, "Page has no title");
                return Err(ClassifyError::ExtractionEmpty);
            }
        };

        let prediction = model
            .classify(&title)
            .map_err(|source| ClassifyError::Prediction {
                kind: request.model,
                source,
            })?;
        let selected =
            select_labels(&prediction, threshold).ok_or(ClassifyError::Prediction {
                kind: request.model,
                source: PredictionError::EmptyInput,
            })?;

        info!(
            title = %truncate_for_log(&title, 120),
            labels = ?selected.names().collect::<Vec<_>>(),
            fallback = selected.is_fallback(),
            %threshold,
            "Classified article"
        );
        Ok(Classification {
            url: url.to_string(),
            title,
            model: request.model,
            threshold,
            prediction,
            selected,
        })
    }
}

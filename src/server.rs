//! Web form front end.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/` | GET | empty form |
//! | `/` | POST | classify `url` with `model_type` at `threshold` percent |
//! | `/healthz` | GET | liveness check |
//!
//! Every request failure is rendered as a message on the page; the
//! handler itself never fails.

use crate::classifier::{ModelKind, Threshold};
use crate::outputs::html::{PageView, render_page};
use crate::pipeline::{AppContext, ClassifyRequest};
use crate::scrapers::PageSource;
use crate::validate::HostResolver;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fields of the classification form. Missing fields are treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct ClassifyForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub model_type: String,
    #[serde(default)]
    pub threshold: String,
}

pub fn router<R, F>(ctx: Arc<AppContext<R, F>>) -> Router
where
    R: HostResolver + 'static,
    F: PageSource + 'static,
{
    Router::new()
        .route("/", get(index::<R, F>).post(submit::<R, F>))
        .route("/healthz", get(healthz))
        .with_state(ctx)
}

#[instrument(level = "info", skip_all, fields(%bind))]
pub async fn serve(ctx: AppContext, bind: SocketAddr) -> Result<(), Box<dyn Error>> {
    let app = router(Arc::new(ctx));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Serving classification form");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index<R, F>(State(ctx): State<Arc<AppContext<R, F>>>) -> Html<String>
where
    R: HostResolver,
    F: PageSource,
{
    Html(render_page(&base_view(&ctx, ModelKind::NaiveBayes, None)))
}

#[instrument(level = "info", skip_all)]
async fn submit<R, F>(
    State(ctx): State<Arc<AppContext<R, F>>>,
    Form(form): Form<ClassifyForm>,
) -> Html<String>
where
    R: HostResolver,
    F: PageSource,
{
    let default_threshold = ctx.settings().default_threshold();
    let threshold = Threshold::from_percent_str(&form.threshold, default_threshold);
    let echoed_percent = form
        .threshold
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| (1.0..=99.0).contains(p));

    let model_type = form.model_type.trim();
    let model = if model_type.is_empty() {
        Ok(ModelKind::NaiveBayes)
    } else {
        model_type.parse::<ModelKind>()
    };

    let (selected_model, outcome) = match model {
        Ok(model) => {
            let request = ClassifyRequest {
                url: form.url.clone(),
                model,
                threshold: Some(threshold),
            };
            (model, ctx.classify_url(&request).await)
        }
        Err(e) => (ModelKind::NaiveBayes, Err(e)),
    };

    let outcome = match &outcome {
        Ok(result) => Ok(result),
        Err(e) => {
            warn!(error = %e, "Request failed");
            Err(e.user_message())
        }
    };
    let mut view = base_view(&ctx, selected_model, echoed_percent);
    view.outcome = Some(outcome);
    Html(render_page(&view))
}

fn base_view<'a, R, F>(
    ctx: &AppContext<R, F>,
    selected_model: ModelKind,
    threshold_percent: Option<f64>,
) -> PageView<'a>
where
    R: HostResolver,
    F: PageSource,
{
    PageView {
        models: ModelKind::ALL
            .into_iter()
            .map(|kind| (kind, ctx.registry().is_available(kind)))
            .collect(),
        selected_model,
        threshold_percent,
        default_threshold: ctx.settings().default_threshold(),
        outcome: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelRegistry, TopicModel, TrainingParams};
    use crate::config::Settings;
    use crate::dataset::keyword_samples;
    use crate::error::{FetchError, ValidationError};
    use crate::models::FetchedDocument;
    use crate::text::TextNormalizer;
    use std::net::IpAddr;
    use url::Url;

    struct PublicResolver;

    impl HostResolver for PublicResolver {
        async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, ValidationError> {
            Ok(vec!["8.8.8.8".parse().unwrap()])
        }
    }

    struct StaticPage(&'static str);

    impl PageSource for StaticPage {
        async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
            Ok(FetchedDocument {
                url: url.clone(),
                body: self.0.to_string(),
            })
        }
    }

    async fn spawn_app() -> SocketAddr {
        let model = TopicModel::train(
            &keyword_samples(),
            TextNormalizer::vietnamese(),
            TrainingParams::default(),
        )
        .unwrap();
        let ctx = AppContext::new(
            Settings::default(),
            ModelRegistry::from_models([(ModelKind::NaiveBayes, model)]),
            PublicResolver,
            StaticPage(r#"<meta property="og:title" content="Ca sĩ lộ clip với học sinh">"#),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(ctx))).await.unwrap();
        });
        addr
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    async fn post_form(addr: SocketAddr, body: &'static str) -> String {
        client()
            .post(format!("http://{addr}/"))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz_and_form() {
        let addr = spawn_app().await;
        let health = client()
            .get(format!("http://{addr}/healthz"))
            .send()
            .await
            .unwrap();
        assert_eq!(health.status(), 200);

        let page = client()
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("<form method=\"post\""));
        assert!(page.contains("RNN (not loaded)"));
    }

    #[tokio::test]
    async fn test_post_classifies_url() {
        let addr = spawn_app().await;
        let page = post_form(addr, "url=vnexpress.net%2Fa.html&model_type=nb&threshold=30").await;
        assert!(page.contains("Ca sĩ lộ clip với học sinh"), "{page}");
        assert!(page.contains("<span class=\"tag\">giải trí</span>"));
        assert!(page.contains("value=\"30\""));
    }

    #[tokio::test]
    async fn test_post_errors_are_rendered() {
        let addr = spawn_app().await;
        let page = post_form(addr, "url=http%3A%2F%2Flocalhost%2Fx&model_type=nb").await;
        assert!(page.contains("class=\"error\""));
        assert!(page.contains("Invalid URL"));

        let page = post_form(addr, "url=vnexpress.net&model_type=rnn").await;
        assert!(page.contains("RNN model is not loaded"));

        let page = post_form(addr, "url=vnexpress.net&model_type=svm").await;
        assert!(page.contains("Unknown model type: svm"));
    }
}

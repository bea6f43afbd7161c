//! HTTP retrieval of article pages.
//!
//! [`PageFetcher`] wraps one shared `reqwest::Client` configured with the
//! browser-like headers news sites expect and a total request timeout. Every
//! connection it opens, including each redirect hop, resolves names through
//! [`PublicOnlyResolver`], so a host that resolves into private or loopback
//! space is refused at connect time. Redirects to non-public IP literals are
//! refused by the redirect policy. Failures are reduced to a [`FetchError`]
//! and never retried.

use crate::config::Settings;
use crate::error::{ConfigError, FetchError, ValidationError};
use crate::models::FetchedDocument;
use crate::validate::{HostResolver, SystemResolver, check_resolved, normalize_url};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use std::error::Error as StdError;
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const MAX_REDIRECTS: usize = 5;

/// Something that can retrieve a page's markup.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedDocument, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    /// Builds the HTTP client used for every page request.
    ///
    /// # Arguments
    /// * `user_agent` - Value of the `User-Agent` header
    /// * `accept_language` - Value of the `Accept-Language` header
    /// * `timeout` - Total time allowed for one request, redirects included
    /// * `resolver` - Name resolution for every connection; answers that are
    ///   not entirely public are refused
    ///
    /// # Returns
    /// * `Result<PageFetcher, ConfigError>` - `Invalid` when a header value
    ///   is not representable or the client cannot be built
    pub fn new<R: HostResolver + 'static>(
        user_agent: &str,
        accept_language: &str,
        timeout: Duration,
        resolver: R,
    ) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(accept_language)
                .map_err(|e| ConfigError::Invalid(format!("accept_language: {e}")))?,
        );

        // A proxy would resolve the target itself and bypass the resolver.
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .no_proxy()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(public_redirects_only())
            .dns_resolver(Arc::new(PublicOnlyResolver::new(resolver)))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(
            &settings.user_agent,
            &settings.accept_language,
            settings.fetch_timeout(),
            SystemResolver::new(settings.dns_timeout()),
        )
    }
}

impl PageSource for PageFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Page returned an error status");
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text_with_charset("utf-8")
            .await
            .map_err(classify_error)?;
        debug!(chars = body.len(), final_url = %final_url, "Fetched page");

        Ok(FetchedDocument {
            url: final_url,
            body,
        })
    }
}

/// DNS for the HTTP client. Rejects any answer containing a non-public
/// address, so rebinding between validation and connect is caught too.
pub struct PublicOnlyResolver<R> {
    inner: Arc<R>,
}

impl<R: HostResolver> PublicOnlyResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<R: HostResolver + 'static> Resolve for PublicOnlyResolver<R> {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let host = name.as_str();
            let ips = inner.lookup(host).await?;
            check_resolved(host, &ips)?;
            // The connector replaces port 0 with the URL's port.
            let addrs: Addrs = Box::new(ips.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<_, Box<dyn StdError + Send + Sync>>(addrs)
        })
    }
}

/// Follow at most [`MAX_REDIRECTS`] redirects, and only to targets that pass
/// the same syntactic checks as a submitted URL. Names are checked again by
/// the resolver when the hop connects.
fn public_redirects_only() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("more than {MAX_REDIRECTS} redirects"));
        }
        match normalize_url(attempt.url().as_str()) {
            Ok(_) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    })
}

/// Reduce a transport error to the fetch taxonomy. Error types found in the
/// source chain decide; message text is only consulted when none match.
fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Timeout;
    }
    if let Some(status) = e.status() {
        return FetchError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        };
    }
    if let Some(refused) = find_source::<ValidationError>(&e) {
        return match refused {
            ValidationError::Unresolvable(detail) => FetchError::Dns(detail.clone()),
            other => FetchError::NonPublicTarget(other.to_string()),
        };
    }
    if is_tls_failure(&e) {
        return FetchError::Tls(root_cause(&e));
    }
    if e.is_redirect() {
        return FetchError::Unknown(root_cause(&e));
    }

    let chain = source_chain(&e).to_lowercase();
    if chain.contains("dns error") || chain.contains("failed to lookup address") {
        FetchError::Dns(root_cause(&e))
    } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("handshake")
    {
        FetchError::Tls(root_cause(&e))
    } else if e.is_connect() {
        FetchError::Unknown(format!("connection failed: {}", root_cause(&e)))
    } else {
        FetchError::Unknown(root_cause(&e))
    }
}

/// First error of type `T` in the source chain, looking inside `io::Error`
/// wrappers as well.
fn find_source<'a, T: StdError + 'static>(e: &'a reqwest::Error) -> Option<&'a T> {
    let mut source = e.source();
    while let Some(inner) = source {
        if let Some(found) = inner.downcast_ref::<T>() {
            return Some(found);
        }
        if let Some(found) = inner
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|wrapped| wrapped.downcast_ref::<T>())
        {
            return Some(found);
        }
        source = inner.source();
    }
    None
}

/// A rustls error anywhere in the chain, or malformed data while
/// connecting to an https URL (the server did not speak TLS).
fn is_tls_failure(e: &reqwest::Error) -> bool {
    if find_source::<rustls::Error>(e).is_some() {
        return true;
    }
    let https = e.url().is_some_and(|u| u.scheme() == "https");
    let mut source = e.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if https && e.is_connect() && io.kind() == ErrorKind::InvalidData {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

fn source_chain(e: &reqwest::Error) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = e.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

fn root_cause(e: &reqwest::Error) -> String {
    let mut cause: &dyn StdError = e;
    while let Some(inner) = cause.source() {
        cause = inner;
    }
    cause.to_string()
}

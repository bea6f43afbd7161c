//! Public-URL validation.
//!
//! A submitted URL is only fetched once it is known to point at the public
//! internet: syntactic checks first ([`normalize_url`]), then a DNS lookup
//! whose answers must all be public addresses ([`validate_public_url`]).
//! The HTTP client applies [`check_resolved`] again on every connection it
//! opens. Nothing in this module issues an HTTP request.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::{Host, Url};

static HOST_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9.-]+$").unwrap());
static SCHEME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").unwrap());

/// Name resolution, abstracted so validation can be tested without a network.
pub trait HostResolver: Send + Sync {
    fn lookup(
        &self,
        host: &str,
    ) -> impl Future<Output = Result<Vec<IpAddr>, ValidationError>> + Send;
}

/// Resolver backed by the operating system, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ValidationError> {
        let lookup = tokio::net::lookup_host((host, 0));
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(addrs)) => Ok(addrs.map(|a| a.ip()).collect()),
            Ok(Err(e)) => Err(ValidationError::Unresolvable(e.to_string())),
            Err(_) => Err(ValidationError::Unresolvable(format!(
                "no answer within {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

/// Syntactic validation. Adds `http://` when no scheme is given and rejects
/// anything that cannot be a public web address without consulting DNS.
pub fn normalize_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let candidate = if SCHEME_PREFIX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&candidate).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }

    match url.host() {
        None => return Err(ValidationError::MissingHost),
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip))?,
        Some(Host::Domain(domain)) => {
            let host = domain.trim_end_matches('.').to_lowercase();
            if host.is_empty() {
                return Err(ValidationError::MissingHost);
            }
            if host == "localhost" || host.ends_with(".localhost") {
                return Err(ValidationError::Localhost);
            }
            if host.ends_with(".local") {
                return Err(ValidationError::LocalDomain);
            }
            if !HOST_CHARS.is_match(&host) {
                return Err(ValidationError::InvalidHostCharacters);
            }
            if !host.contains('.') {
                return Err(ValidationError::NotPublicDomain);
            }
        }
    }
    Ok(url)
}

/// Full validation: [`normalize_url`], then DNS for domain names. IP
/// literals were already checked and are not resolved.
#[instrument(level = "info", skip_all, fields(url = %raw.trim()))]
pub async fn validate_public_url<R: HostResolver>(
    raw: &str,
    resolver: &R,
) -> Result<Url, ValidationError> {
    let url = normalize_url(raw)?;
    let domain = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        _ => return Ok(url),
    };

    let addrs = resolver.lookup(&domain).await?;
    check_resolved(&domain, &addrs)?;
    Ok(url)
}

/// Accept a DNS answer only when it is non-empty and every address in it
/// is public.
///
/// # Arguments
/// * `host` - The name that was resolved, for logging
/// * `addrs` - Every address the resolver returned
///
/// # Returns
/// * `Result<(), ValidationError>` - `Unresolvable` for an empty answer,
///   `ResolvesToNonPublic` when any address is private, loopback or reserved
pub fn check_resolved(host: &str, addrs: &[IpAddr]) -> Result<(), ValidationError> {
    if addrs.is_empty() {
        return Err(ValidationError::Unresolvable("no addresses returned".into()));
    }
    if !addrs.iter().copied().all(is_public_ip) {
        warn!(%host, ?addrs, "Host resolves to a non-public address");
        return Err(ValidationError::ResolvesToNonPublic);
    }
    debug!(%host, count = addrs.len(), "Host resolved");
    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), ValidationError> {
    if is_public_ip(ip) {
        Ok(())
    } else {
        Err(ValidationError::NonPublicAddress(ip))
    }
}

/// Whether an address is routable on the public internet.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || a == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..128).contains(&b))
        // 192.0.0.0/24 protocol assignments
        || (a == 192 && b == 0 && ip.octets()[2] == 0)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b == 18 || b == 19))
        // 240.0.0.0/4 reserved
        || a >= 240)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = embedded_v4(ip) {
        return is_public_v4(v4);
    }
    let first = ip.segments()[0];
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        // 2001:db8::/32 documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8))
}

/// IPv4 address carried inside an IPv6 one: v4-mapped `::ffff:0:0/96`,
/// v4-compatible `::/96`, NAT64 `64:ff9b::/96` and 6to4 `2002::/16`.
fn embedded_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return Some(v4);
    }
    let seg = ip.segments();
    let octets = ip.octets();
    let tail = Ipv4Addr::new(octets[12], octets[13], octets[14], octets[15]);
    match seg {
        [0, 0, 0, 0, 0, 0, _, _] if !ip.is_unspecified() && !ip.is_loopback() => Some(tail),
        [0x64, 0xff9b, 0, 0, 0, 0, _, _] => Some(tail),
        [0x2002, ..] => Some(Ipv4Addr::new(octets[2], octets[3], octets[4], octets[5])),
        _ => None,
    }
}

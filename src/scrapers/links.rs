//! Batch title scraping from a links file into a dataset.
//!
//! # Links file format
//!
//! One article per line, either a bare URL or `<url>: <tag>`:
//!
//! ```text
//! https://vnexpress.net/ca-si-lo-clip-4711.html: giải trí
//! https://dantri.com.vn/giao-duc/hoc-phi-tang.htm: Giáo dục, kinh doanh
//! https://tuoitre.vn/untagged-article.htm
//! ```
//!
//! The separator is the first `": "` after the scheme, so the `://` of the
//! URL itself is never mistaken for it. Blank lines and `#` comments are
//! skipped.

use super::fetch::PageSource;
use super::title::{extract_excerpt, extract_title};
use crate::error::{DatasetError, FetchError};
use crate::models::{Dataset, DatasetEntry, ExtractedTitle};
use crate::utils::truncate_for_log;
use crate::validate::normalize_url;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Words of body text kept per article with `--with-content`.
pub const EXCERPT_WORDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub url: String,
    /// Annotator tags, possibly empty.
    pub tag: String,
}

/// Parse one line of a links file: `<url>: <tags>` or a bare URL.
///
/// # Arguments
/// * `line` - One raw line; surrounding whitespace is ignored
///
/// # Returns
/// * `Option<LinkEntry>` - `None` for blank lines and `#` comments. The
///   separator is the first `": "` after the scheme's `://`, or after the
///   start of the line when there is no scheme.
pub fn parse_link_line(line: &str) -> Option<LinkEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let search_from = line.find("://").map_or(0, |i| i + 3);
    let separator = line[search_from..].find(": ").map(|i| i + search_from);
    let entry = match separator {
        Some(i) => LinkEntry {
            url: line[..i].trim().to_string(),
            tag: line[i + 2..].trim().to_string(),
        },
        None => LinkEntry {
            url: line.to_string(),
            tag: String::new(),
        },
    };
    Some(entry)
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_links(path: &Path) -> Result<Vec<LinkEntry>, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let links: Vec<LinkEntry> = raw.lines().filter_map(parse_link_line).collect();
    info!(count = links.len(), "Read links");
    Ok(links)
}

/// Fetch every link one after another, waiting `delay` between requests.
///
/// Failed pages and pages without a title are logged and skipped without
/// failing the batch.
///
/// # Arguments
/// * `source` - Page fetcher
/// * `links` - Entries read from the links file
/// * `delay` - Pause before every request after the first
/// * `with_content` - Also keep the first [`EXCERPT_WORDS`] words of body text
///
/// # Returns
/// * `Dataset` - One entry per page whose title was found, keyed by the
///   URL as written in the links file
#[instrument(level = "info", skip_all, fields(links = links.len(), with_content = with_content))]
pub async fn scrape_links<S: PageSource>(
    source: &S,
    links: Vec<LinkEntry>,
    delay: Duration,
    with_content: bool,
) -> Dataset {
    let total = links.len();
    let dataset: Dataset = stream::iter(links.into_iter().enumerate())
        .then(|(i, link)| async move {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match scrape_one(source, &link.url, with_content).await {
                Ok(Some((title, content))) => {
                    debug!(index = i, url = %link.url, title = %truncate_for_log(&title, 80), "Scraped title");
                    Some((
                        link.url,
                        DatasetEntry {
                            title,
                            tag: link.tag,
                            content,
                        },
                    ))
                }
                Ok(None) => {
                    warn!(index = i, url = %link.url, "No title found; skipping");
                    None
                }
                Err(e) => {
                    error!(index = i, url = %link.url, error = %e, "Scrape failed; skipping");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(
        total,
        scraped = dataset.len(),
        failed = total - dataset.len(),
        "Finished scraping links"
    );
    dataset
}

async fn scrape_one<S: PageSource>(
    source: &S,
    raw_url: &str,
    with_content: bool,
) -> Result<Option<(String, Option<String>)>, FetchError> {
    let url = normalize_url(raw_url).map_err(|e| FetchError::Unknown(e.to_string()))?;
    let page = source.fetch(&url).await?;

    let document = Html::parse_document(&page.body);
    let ExtractedTitle::Found(title) = extract_title(&document) else {
        return Ok(None);
    };
    let content = if with_content {
        extract_excerpt(&document, EXCERPT_WORDS)
    } else {
        None
    };
    Ok(Some((title, content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchedDocument;
    use std::collections::HashMap;
    use url::Url;

    struct FakePages(HashMap<String, Result<String, FetchError>>);

    impl PageSource for FakePages {
        async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
            let body = self
                .0
                .get(url.as_str())
                .cloned()
                .unwrap_or(Err(FetchError::Http {
                    status: 404,
                    reason: "Not Found".into(),
                }))?;
            Ok(FetchedDocument {
                url: url.clone(),
                body,
            })
        }
    }

    #[test]
    fn test_parse_link_line() {
        assert_eq!(
            parse_link_line("https://vnexpress.net/a.html: Giải trí, giáo dục"),
            Some(LinkEntry {
                url: "https://vnexpress.net/a.html".into(),
                tag: "Giải trí, giáo dục".into(),
            })
        );
        assert_eq!(
            parse_link_line("  http://dantri.com.vn/b.htm  "),
            Some(LinkEntry {
                url: "http://dantri.com.vn/b.htm".into(),
                tag: String::new(),
            })
        );
        assert_eq!(
            parse_link_line("a.vn/1: giải trí"),
            Some(LinkEntry {
                url: "a.vn/1".into(),
                tag: "giải trí".into(),
            })
        );
        assert_eq!(
            parse_link_line("http://a.vn:8080/x: kinh doanh"),
            Some(LinkEntry {
                url: "http://a.vn:8080/x".into(),
                tag: "kinh doanh".into(),
            })
        );
        assert_eq!(parse_link_line("   "), None);
        assert_eq!(parse_link_line("# comment"), None);
    }

    #[test]
    fn test_read_links_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("link.txt");
        std::fs::write(
            &path,
            "https://a.vn/1: giải trí\n\nhttps://a.vn/2\n# skipped\n",
        )
        .unwrap();
        let links = read_links(&path).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].tag, "giải trí");
        assert!(read_links(&dir.path().join("missing.txt")).is_err());
    }

    #[tokio::test]
    async fn test_scrape_links_skips_failures() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://a.vn/1".to_string(),
            Ok(r#"<meta property="og:title" content="Ca sĩ lộ clip">"#.to_string()),
        );
        pages.insert(
            "https://a.vn/2".to_string(),
            Ok("<html><body><p>no title</p></body></html>".to_string()),
        );
        pages.insert("https://a.vn/3".to_string(), Err(FetchError::Timeout));
        let links = ["https://a.vn/1: giải trí", "https://a.vn/2", "https://a.vn/3", "https://a.vn/4"]
            .iter()
            .filter_map(|l| parse_link_line(l))
            .collect();

        let dataset = scrape_links(&FakePages(pages), links, Duration::ZERO, false).await;
        assert_eq!(dataset.len(), 1);
        let entry = &dataset["https://a.vn/1"];
        assert_eq!(entry.title, "Ca sĩ lộ clip");
        assert_eq!(entry.tag, "giải trí");
        assert_eq!(entry.content, None);
    }

    #[tokio::test]
    async fn test_scrape_links_with_content() {
        let words = (0..30).map(|i| format!("từ{i}")).collect::<Vec<_>>().join(" ");
        let mut pages = HashMap::new();
        pages.insert(
            "https://a.vn/1".to_string(),
            Ok(format!(
                "<html><head><title>Tiêu đề</title></head><body><article><p>{words}</p></article></body></html>"
            )),
        );
        let links = vec![LinkEntry {
            url: "https://a.vn/1".into(),
            tag: "giáo dục".into(),
        }];
        let dataset = scrape_links(&FakePages(pages), links, Duration::ZERO, true).await;
        assert_eq!(dataset["https://a.vn/1"].content.as_deref(), Some(words.as_str()));
    }
}

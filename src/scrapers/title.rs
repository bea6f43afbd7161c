//! Title and body-excerpt extraction from parsed article markup.
//!
//! # Title fallback chain
//!
//! | Order | Source | Notes |
//! |-------|--------|-------|
//! | 1 | `<meta property="og:title">` | most reliable for news articles |
//! | 2 | `<title>` | often carries a site-name suffix |
//! | 3 | `<meta name="twitter:title">` | |
//! | 4 | first `<h1>` | |
//!
//! The first candidate that is non-empty after trimming wins.

use crate::models::ExtractedTitle;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static TWITTER_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="twitter:title"]"#).unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Article body containers of common Vietnamese news sites, most specific
/// first; generic containers last.
static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "div.fck_detail",
        "div.article-body",
        "div.detail-content",
        "div#main-detail-body",
        "div.singular-content",
        "div.dt-news__content",
        "div.detail__cmain",
        "div#contentBody",
        "div.the-article-body",
        "div.article__body",
        "div.content-detail",
        "div.content",
        "div.post-content",
        "div.entry-content",
        "main",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

/// Text inside these elements is never article prose.
const NOISE_TAGS: [&str; 9] = [
    "script", "style", "figure", "figcaption", "aside", "nav", "form", "button", "iframe",
];

/// An excerpt shorter than this is not trusted and the next container is tried.
const MIN_EXCERPT_WORDS: usize = 20;

/// Best-effort page title. Pure; never fails.
///
/// # Arguments
/// * `document` - Parsed HTML page
///
/// # Returns
/// * `ExtractedTitle` - The first non-empty of `og:title`, `<title>`,
///   `twitter:title` and the first `<h1>`, whitespace collapsed, or
///   `NotFound` when none has text
pub fn extract_title(document: &Html) -> ExtractedTitle {
    meta_content(document, &OG_TITLE)
        .or_else(|| element_text(document, &TITLE))
        .or_else(|| meta_content(document, &TWITTER_TITLE))
        .or_else(|| element_text(document, &H1))
        .map(ExtractedTitle::Found)
        .unwrap_or(ExtractedTitle::NotFound)
}

/// Parse markup and extract its title. The parsed tree is dropped before
/// returning, so callers may hold the result across `.await` points.
pub fn extract_title_from_markup(markup: &str) -> ExtractedTitle {
    extract_title(&Html::parse_document(markup))
}

/// First `max_words` words of the article body, if any body text is found.
///
/// # Arguments
/// * `document` - Parsed HTML page
/// * `max_words` - Upper bound on the number of words returned
///
/// # Returns
/// * `Option<String>` - Words of the first content container with enough
///   prose, else of all `<p>` elements; `None` when the page has no text
pub fn extract_excerpt(document: &Html, max_words: usize) -> Option<String> {
    let mut words: Vec<String> = Vec::new();
    for selector in CONTENT_SELECTORS.iter() {
        if let Some(container) = document.select(selector).next() {
            words = prose_words(container);
            if words.len() >= MIN_EXCERPT_WORDS {
                break;
            }
        }
    }
    if words.len() < MIN_EXCERPT_WORDS {
        words = document
            .select(&PARAGRAPH)
            .flat_map(|p| collapse(p.text()).split(' ').map(str::to_string).collect::<Vec<_>>())
            .filter(|w| !w.is_empty())
            .collect();
    }
    (!words.is_empty()).then(|| words.into_iter().take(max_words).collect::<Vec<_>>().join(" "))
}

/// [`extract_excerpt`] over unparsed markup; the tree is dropped before
/// returning.
pub fn extract_excerpt_from_markup(markup: &str, max_words: usize) -> Option<String> {
    extract_excerpt(&Html::parse_document(markup), max_words)
}

/// `content` attribute of the first element matching a meta selector.
fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Whitespace-collapsed text of the first element matching `selector`.
fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| collapse(el.text()))
        .filter(|s| !s.is_empty())
}

fn collapse<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words of every text node under `container` that is not inside a noise
/// element between it and `container`.
fn prose_words(container: ElementRef<'_>) -> Vec<String> {
    let root = container.id();
    container
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let in_noise = node
                .ancestors()
                .take_while(|a| a.id() != root)
                .filter_map(|a| a.value().as_element())
                .any(|el| NOISE_TAGS.contains(&el.name()));
            (!in_noise).then_some(&**text)
        })
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

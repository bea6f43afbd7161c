//! Page retrieval and title extraction.
//!
//! Retrieval and parsing are kept apart: [`fetch`] produces raw markup, and
//! [`title`] turns markup into a title (and optionally a body excerpt)
//! without touching the network.
//!
//! # Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fetch`] | [`PageSource`] trait and its `reqwest` implementation |
//! | [`title`] | og:title → title → twitter:title → h1 fallback chain |
//! | [`links`] | batch scraping of a links file into a dataset |
//!
//! Parsed documents are never held across an `.await`: callers parse,
//! extract and drop the tree synchronously.

pub mod fetch;
pub mod links;
pub mod title;

pub use fetch::{PageFetcher, PageSource};

//! # Headline Tagger
//!
//! Scrapes news article titles, trains a multi-label topic classifier on
//! them and classifies new articles by URL from the command line or a small
//! web form.
//!
//! ## Architecture
//!
//! A single classification request runs:
//! 1. **Validation**: the URL must point at a public host ([`validate`])
//! 2. **Fetching**: the page is retrieved with a timeout ([`scrapers::fetch`])
//! 3. **Extraction**: og:title → title → twitter:title → h1 ([`scrapers::title`])
//! 4. **Normalization**: lowercasing and Vietnamese word segmentation ([`text`])
//! 5. **Prediction**: one-vs-rest Naive Bayes over tf-idf n-grams ([`classifier`])
//! 6. **Selection**: labels over the threshold, or the arg-max label
//!
//! Offline, `scrape` builds the training dataset from a links file and
//! `train` fits and saves the model the request path loads.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod scrapers;
pub mod server;
pub mod text;
pub mod utils;
pub mod validate;

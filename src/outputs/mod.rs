//! Output generation for files, terminals and the web form.
//!
//! # Submodules
//!
//! - [`json`]: writes scraped datasets and prediction reports
//! - [`report`]: plain-text tables for the command line
//! - [`html`]: the classification form and its results
//!
//! # Output Structure
//!
//! ```text
//! data.json          # scrape: {url: {title, tag, content?}}
//! predictions.json   # predict --output: {url: {title, predicted_tags}}
//! ```

pub mod html;
pub mod json;
pub mod report;

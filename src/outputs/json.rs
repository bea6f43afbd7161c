//! JSON files written by the command handlers.
//!
//! # Files
//!
//! - `data.json` from `scrape`: `{url: {title, tag, content?}}`
//! - prediction reports from `predict`: `{url: {title, predicted_tags}}`
//!
//! Both are maps keyed by URL, or by zero-padded 1-based position for titles
//! given on the command line ([`positional_keys`]), pretty-printed with
//! non-ASCII text kept as is.

use crate::models::Dataset;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// One row of a prediction report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedEntry {
    pub title: String,
    pub predicted_tags: Vec<String>,
}

pub type PredictionReport = BTreeMap<String, PredictedEntry>;

/// Pair each title with its report key: its 1-based position, zero-padded
/// so the report's key order is the input order. Repeated titles keep
/// separate entries.
///
/// # Arguments
/// * `titles` - Titles in the order they were given
///
/// # Returns
/// * `Vec<(String, String)>` - `(key, title)` pairs
pub fn positional_keys(titles: Vec<String>) -> Vec<(String, String)> {
    let width = titles.len().to_string().len();
    titles
        .into_iter()
        .enumerate()
        .map(|(i, title)| (format!("{:0width$}", i + 1), title))
        .collect()
}

/// Write a scraped [`Dataset`] to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), entries = dataset.len()))]
pub async fn write_dataset(dataset: &Dataset, path: &Path) -> Result<(), Box<dyn Error>> {
    write_pretty(dataset, path).await?;
    info!("Wrote dataset");
    Ok(())
}

/// Write a [`PredictionReport`] to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), entries = report.len()))]
pub async fn write_predictions(
    report: &PredictionReport,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    write_pretty(report, path).await?;
    info!("Wrote prediction report");
    Ok(())
}

async fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    fs::write(path, json).await?;
    Ok(())
}

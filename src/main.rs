//! Command-line entry point: parses arguments, loads settings and runs one
//! subcommand.
//!
//! ```sh
//! headline_tagger scrape --links link.txt --output data.json
//! headline_tagger train --data data.json
//! headline_tagger predict "Ca sĩ lộ clip với học sinh"
//! headline_tagger serve
//! ```

use clap::Parser;
use headline_tagger::classifier::vectorizer::VectorizerParams;
use headline_tagger::classifier::{ModelKind, TopicModel, TrainingParams, select_labels};
use headline_tagger::cli::{Cli, Command};
use headline_tagger::config::Settings;
use headline_tagger::dataset::{
    keyword_samples, load_dataset, load_datasets, samples_from_dataset, tag_counts,
};
use headline_tagger::error::ClassifyError;
use headline_tagger::outputs::json::{
    PredictedEntry, PredictionReport, positional_keys, write_dataset, write_predictions,
};
use headline_tagger::outputs::report::{
    render_classification, render_selection, render_tag_counts,
};
use headline_tagger::pipeline::{AppContext, ClassifyRequest};
use headline_tagger::scrapers::PageFetcher;
use headline_tagger::scrapers::links::{read_links, scrape_links};
use headline_tagger::server;
use headline_tagger::text::TextNormalizer;
use headline_tagger::utils::{ensure_writable_parent, truncate_for_log};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let bind = match &args.command {
        Command::Serve { bind } => *bind,
        _ => None,
    };
    let settings = Settings::load(args.settings.config.as_deref())?
        .with_overrides(args.settings.overrides(bind))?;
    debug!(?settings, "Effective settings");

    let result = match args.command {
        Command::Scrape {
            links,
            output,
            delay_ms,
            with_content,
        } => scrape(&settings, &links, &output, Duration::from_millis(delay_ms), with_content).await,
        Command::Train {
            data,
            output,
            no_keywords,
            with_content,
            alpha,
            min_df,
            max_df,
        } => {
            let params = TrainingParams {
                vectorizer: VectorizerParams {
                    min_df,
                    max_df,
                    ..VectorizerParams::default()
                },
                alpha,
            };
            train(&settings, &data, output, !no_keywords, with_content, params)
        }
        Command::Predict {
            titles,
            dataset,
            output,
            model,
        } => predict(&settings, titles, dataset.as_deref(), output.as_deref(), model).await,
        Command::Classify { url, model, json } => classify(settings, url, model, json).await,
        Command::Serve { .. } => serve(settings).await,
        Command::Stats { data } => stats(&data),
    };

    match &result {
        Ok(()) => info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "Done"),
        Err(e) => error!(error = %e, "Command failed"),
    }
    result
}

#[instrument(level = "info", skip_all, fields(links = %links.display(), output = %output.display()))]
async fn scrape(
    settings: &Settings,
    links: &Path,
    output: &Path,
    delay: Duration,
    with_content: bool,
) -> Result<(), Box<dyn Error>> {
    // Fail before the first request rather than after the last.
    ensure_writable_parent(output).await?;

    let links = read_links(links)?;
    if links.is_empty() {
        warn!("No links to scrape");
        return Ok(());
    }
    let fetcher = PageFetcher::from_settings(settings)?;
    let dataset = scrape_links(&fetcher, links, delay, with_content).await;
    write_dataset(&dataset, output).await?;
    Ok(())
}

/// Segmenter used for training: the built-in lexicon plus the configured
/// phrase file, if any.
fn training_normalizer(settings: &Settings) -> Result<TextNormalizer, Box<dyn Error>> {
    let mut normalizer = TextNormalizer::vietnamese();
    if let Some(path) = &settings.lexicon_path {
        let added = normalizer.extend_from_file(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Cannot read lexicon file");
            e
        })?;
        info!(path = %path.display(), added, total = normalizer.lexicon_len(), "Extended lexicon");
    }
    Ok(normalizer)
}

#[instrument(level = "info", skip_all, fields(datasets = data.len(), keywords = with_keywords))]
fn train(
    settings: &Settings,
    data: &[PathBuf],
    output: Option<PathBuf>,
    with_keywords: bool,
    with_content: bool,
    params: TrainingParams,
) -> Result<(), Box<dyn Error>> {
    let dataset = load_datasets(data)?;
    let mut samples = samples_from_dataset(&dataset, with_content);
    let scraped = samples.len();
    if with_keywords {
        samples.extend(keyword_samples());
    }
    info!(scraped, total = samples.len(), "Prepared training samples");

    let model = TopicModel::train(&samples, training_normalizer(settings)?, params)?;
    let path = output
        .or_else(|| settings.models.get(&ModelKind::NaiveBayes).cloned())
        .unwrap_or_else(|| PathBuf::from("model_nb.bin"));
    model.save(&path)?;

    println!(
        "Trained on {} samples ({} features) at {}; labels: {}",
        model.n_samples(),
        model.n_features(),
        model.trained_at(),
        model.labels().iter().collect::<Vec<_>>().join(", ")
    );
    println!("Model written to {}", path.display());
    Ok(())
}

#[instrument(level = "info", skip_all, fields(%kind))]
async fn predict(
    settings: &Settings,
    titles: Vec<String>,
    dataset: Option<&Path>,
    output: Option<&Path>,
    kind: ModelKind,
) -> Result<(), Box<dyn Error>> {
    let path = settings
        .models
        .get(&kind)
        .ok_or(ClassifyError::ModelUnavailable(kind))?;
    let model = TopicModel::load(path)?;
    let threshold = settings.default_threshold();

    let inputs: Vec<(String, String)> = match dataset {
        Some(path) => load_dataset(path)?
            .into_iter()
            .map(|(url, entry)| (url, entry.title))
            .collect(),
        None => positional_keys(titles),
    };
    if inputs.is_empty() {
        return Err("no titles to classify; pass titles or --dataset".into());
    }

    let mut report = PredictionReport::new();
    let mut printed = String::new();
    for (key, title) in inputs {
        let prediction = match model.classify(&title) {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!(title = %truncate_for_log(&title, 80), error = %e, "Skipping title");
                continue;
            }
        };
        let Some(selected) = select_labels(&prediction, threshold) else {
            continue;
        };
        if output.is_none() {
            printed.push_str(&render_selection(&title, &selected, threshold));
            printed.push('\n');
        }
        report.insert(
            key,
            PredictedEntry {
                title,
                predicted_tags: selected.names().map(str::to_string).collect(),
            },
        );
    }

    match output {
        Some(path) => write_predictions(&report, path).await?,
        None => print!("{printed}"),
    }
    info!(classified = report.len(), %threshold, "Predicted topics");
    Ok(())
}

async fn classify(
    settings: Settings,
    url: String,
    model: ModelKind,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let ctx = AppContext::from_settings(settings)?;
    let request = ClassifyRequest {
        url,
        model,
        threshold: None,
    };
    match ctx.classify_url(&request).await {
        Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
        Ok(result) => print!("{}", render_classification(&result)),
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    }
    Ok(())
}

async fn serve(settings: Settings) -> Result<(), Box<dyn Error>> {
    let bind = settings.bind;
    let ctx = AppContext::from_settings(settings)?;
    server::serve(ctx, bind).await
}

fn stats(data: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let dataset = load_datasets(data)?;
    let counts = tag_counts(&dataset);
    println!("{} articles", dataset.len());
    print!("{}", render_tag_counts(&counts));
    Ok(())
}

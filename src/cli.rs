//! Command-line interface definitions for Headline Tagger.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Settings shared by every subcommand are global flags and can also be
//! provided via environment variables; they override the YAML config file.

use crate::classifier::ModelKind;
use crate::config::Overrides;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line arguments for the Headline Tagger application.
///
/// # Examples
///
/// ```sh
/// # Scrape titles listed in link.txt into data.json
/// headline_tagger scrape --links link.txt --output data.json
///
/// # Train the Naive Bayes model on one or more datasets
/// headline_tagger train --data data.json --data more.json --output model_nb.bin
///
/// # Classify one article, or serve the web form on port 5000
/// headline_tagger classify https://vnexpress.net/... --threshold 40
/// headline_tagger serve --bind 0.0.0.0:5000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Global settings overrides.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "HEADLINE_TAGGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Probability threshold in percent (1-99); out-of-range values use the default
    #[arg(short, long, global = true, env = "HEADLINE_TAGGER_THRESHOLD")]
    pub threshold: Option<String>,

    /// Seconds before a page fetch times out
    #[arg(long, global = true, env = "HEADLINE_TAGGER_FETCH_TIMEOUT")]
    pub fetch_timeout_secs: Option<u64>,

    /// Naive Bayes model file
    #[arg(long, global = true, env = "HEADLINE_TAGGER_NB_MODEL")]
    pub nb_model: Option<PathBuf>,

    /// RNN model file exported in the same model format
    #[arg(long, global = true, env = "HEADLINE_TAGGER_RNN_MODEL")]
    pub rnn_model: Option<PathBuf>,

    /// Extra word-segmentation phrases, one per line
    #[arg(long, global = true, env = "HEADLINE_TAGGER_LEXICON")]
    pub lexicon: Option<PathBuf>,
}

impl SettingsArgs {
    pub fn overrides(&self, bind: Option<SocketAddr>) -> Overrides {
        let models = [
            (ModelKind::NaiveBayes, &self.nb_model),
            (ModelKind::Recurrent, &self.rnn_model),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.clone().map(|p| (kind, p)))
        .collect();
        Overrides {
            threshold_percent: self.threshold.clone(),
            fetch_timeout_secs: self.fetch_timeout_secs,
            bind,
            models,
            lexicon_path: self.lexicon.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape article titles listed in a links file into a dataset
    Scrape {
        /// Links file: one `<url>: <tag>` or bare URL per line
        #[arg(short, long, default_value = "link.txt")]
        links: PathBuf,

        /// Dataset file to write
        #[arg(short, long, default_value = "data.json")]
        output: PathBuf,

        /// Milliseconds to wait between requests
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Also store the first words of each article body
        #[arg(long)]
        with_content: bool,
    },

    /// Train the Naive Bayes model from scraped datasets
    Train {
        /// Dataset files; later files win on duplicate URLs
        #[arg(short, long = "data", num_args = 1.., default_value = "data.json")]
        data: Vec<PathBuf>,

        /// Model file to write (defaults to the configured `nb` model path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not append the built-in keyword samples
        #[arg(long)]
        no_keywords: bool,

        /// Train on title plus scraped body excerpt
        #[arg(long)]
        with_content: bool,

        /// Naive Bayes smoothing
        #[arg(long, default_value_t = 0.1)]
        alpha: f64,

        /// Drop terms found in fewer documents than this
        #[arg(long, default_value_t = 1)]
        min_df: usize,

        /// Drop terms found in a larger share of documents than this
        #[arg(long, default_value_t = 0.8)]
        max_df: f64,
    },

    /// Predict topics for titles given on the command line or in a dataset
    Predict {
        /// Titles to classify
        titles: Vec<String>,

        /// Classify every title of this dataset file instead
        #[arg(long, conflicts_with = "titles")]
        dataset: Option<PathBuf>,

        /// Write a JSON report instead of printing a table
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model to use
        #[arg(short, long, value_enum, default_value_t = ModelKind::NaiveBayes)]
        model: ModelKind,
    },

    /// Fetch one article URL and classify its title
    Classify {
        /// Article URL; `http://` is assumed when no scheme is given
        url: String,

        /// Model to use
        #[arg(short, long, value_enum, default_value_t = ModelKind::NaiveBayes)]
        model: ModelKind,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the classification web form
    Serve {
        /// Address to bind the HTTP server to (host:port)
        #[arg(short, long, env = "HEADLINE_TAGGER_BIND")]
        bind: Option<SocketAddr>,
    },

    /// Count canonical tags across dataset files
    Stats {
        /// Dataset files
        #[arg(short, long = "data", num_args = 1.., default_value = "data.json")]
        data: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "headline_tagger",
            "scrape",
            "--links",
            "./links.txt",
            "--with-content",
        ]);

        match cli.command {
            Command::Scrape {
                links,
                output,
                delay_ms,
                with_content,
            } => {
                assert_eq!(links, PathBuf::from("./links.txt"));
                assert_eq!(output, PathBuf::from("data.json"));
                assert_eq!(delay_ms, 1000);
                assert!(with_content);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "headline_tagger",
            "classify",
            "vnexpress.net/a",
            "-m",
            "rnn",
            "-t",
            "45",
            "--rnn-model",
            "/tmp/rnn.bin",
        ]);

        assert_eq!(cli.settings.threshold.as_deref(), Some("45"));
        let overrides = cli.settings.overrides(None);
        assert_eq!(
            overrides.models,
            vec![(ModelKind::Recurrent, PathBuf::from("/tmp/rnn.bin"))]
        );
        assert!(matches!(
            cli.command,
            Command::Classify { model: ModelKind::Recurrent, json: false, .. }
        ));
    }

    #[test]
    fn test_train_accepts_several_datasets() {
        let cli = Cli::parse_from([
            "headline_tagger",
            "train",
            "-d",
            "a.json",
            "-d",
            "b.json",
            "--no-keywords",
        ]);

        match cli.command {
            Command::Train {
                data, no_keywords, ..
            } => {
                assert_eq!(data, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert!(no_keywords);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let result = Cli::try_parse_from(["headline_tagger", "classify", "x.vn", "-m", "svm"]);
        assert!(result.is_err());
    }
}

//! Compare command: divergence and hot words between two dates.

use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use turbulence_core::{
    CompareOptions, Config, CorpusFormat, DivergenceReport, HotWord, ListShape, StopwordSet,
    TieMethod, compare,
};

use super::load_distribution;

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Distribution for the first (earlier) date.
    pub first: Utf8PathBuf,

    /// Distribution for the second (later) date.
    pub second: Utf8PathBuf,

    /// Rank exponent (> 0). Small values weigh deep ranks more.
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Hot words to keep per side.
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Input format (inferred from the extension by default).
    #[arg(long, value_enum)]
    pub format: Option<CorpusFormat>,

    /// How list files are read.
    #[arg(long, value_enum, default_value_t)]
    pub shape: ListShape,

    /// Tie handling for equal counts.
    #[arg(long, value_enum)]
    pub ties: Option<TieMethod>,

    /// Word-per-line stopword file (replaces the configured one).
    #[arg(long, value_name = "FILE")]
    pub stopwords: Option<Utf8PathBuf>,

    /// Built-in stopword list, e.g. `en` (replaces the configured one).
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,

    /// Only filter punctuation.
    #[arg(long, conflicts_with_all = ["stopwords", "language"])]
    pub no_stopwords: bool,

    /// Hide the progress spinner.
    #[arg(long)]
    pub no_progress: bool,
}

impl CompareArgs {
    fn options(&self, config: &Config) -> CompareOptions {
        let defaults = config.compare_options();
        CompareOptions {
            alpha: self.alpha.unwrap_or(defaults.alpha),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            tie_method: self.ties.unwrap_or(defaults.tie_method),
        }
    }

    fn stopwords(&self, config: &Config) -> anyhow::Result<StopwordSet> {
        if self.no_stopwords {
            return Ok(StopwordSet::empty());
        }
        let effective = Config {
            stopwords_file: self.stopwords.clone().or_else(|| config.stopwords_file.clone()),
            stopwords_language: self
                .language
                .clone()
                .or_else(|| config.stopwords_language.clone()),
            ..config.clone()
        };
        effective.stopwords().context("failed to load stopwords")
    }
}

/// Compare two distribution files and print the report.
#[instrument(name = "cmd_compare", skip_all, fields(first = %args.first, second = %args.second))]
pub fn cmd_compare(
    args: CompareArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let options = args.options(config);
    debug!(
        alpha = options.alpha,
        top_k = options.top_k,
        ties = %options.tie_method,
        "executing compare command"
    );

    let stopwords = args.stopwords(config)?;
    let x1 = load_distribution(&args.first, args.format, args.shape, max_input_bytes)?;
    let x2 = load_distribution(&args.second, args.format, args.shape, max_input_bytes)?;

    let spinner = (!args.no_progress && !global_json).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} ranking {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{} tokens", x1.len() + x2.len()));
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    let result = compare(&x1, &x2, &options, &stopwords);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result.with_context(|| {
        format!(
            "failed to compare {} with {}",
            args.first, args.second
        )
    })?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&args, &report);
    }

    Ok(())
}

fn print_report(args: &CompareArgs, report: &DivergenceReport) {
    println!(
        "{}: {:.4}",
        "Divergence".bold(),
        report.divergence.yellow()
    );
    println!(
        "{}",
        format!(
            "alpha {:.4}, ties {}, {} + {} tokens, vocabulary {}",
            report.alpha, report.tie_method, report.n1, report.n2, report.vocabulary
        )
        .dimmed()
    );

    println!();
    print_side(&args.first.to_string(), &report.side1);
    println!();
    print_side(&args.second.to_string(), &report.side2);
}

fn print_side(label: &str, words: &[HotWord]) {
    println!("{}", format!("Hot words ({label})").bold().underline());
    if words.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    let width = words.iter().map(|w| w.name.chars().count()).max().unwrap_or(0);
    for word in words {
        println!("  {:<width$}  {}", word.name.cyan(), word.value);
    }
}

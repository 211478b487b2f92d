//! Trend command: how chosen words moved across a run of dated files.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use turbulence_core::{CorpusFormat, CorpusLoader, ListShape, SeriesLoader, TieMethod, TokenSeries};

use super::rank::format_rank;

/// Arguments for the `trend` subcommand.
#[derive(Args, Debug)]
pub struct TrendArgs {
    /// Word to follow (repeatable).
    #[arg(short = 'w', long = "word", value_name = "WORD", required = true)]
    pub words: Vec<String>,

    /// Dated distribution files; each file's stem is its date.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<Utf8PathBuf>,

    /// Tie handling for files without a rank column.
    #[arg(long, value_enum)]
    pub ties: Option<TieMethod>,

    /// Input format (inferred from the extension by default).
    #[arg(long, value_enum)]
    pub format: Option<CorpusFormat>,

    /// How list files are read.
    #[arg(long, value_enum, default_value_t)]
    pub shape: ListShape,
}

#[derive(Serialize)]
struct TrendOutput {
    tie_method: TieMethod,
    dates: usize,
    series: Vec<TokenSeries>,
}

/// Print the count, rank and frequency of each word on every date it appears.
#[instrument(name = "cmd_trend", skip_all, fields(files = args.files.len()))]
pub fn cmd_trend(
    args: TrendArgs,
    global_json: bool,
    config_ties: TieMethod,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let tie_method = args.ties.unwrap_or(config_ties);
    debug!(words = ?args.words, ties = %tie_method, "executing trend command");

    let corpus = CorpusLoader::new()
        .with_format(args.format)
        .with_shape(args.shape)
        .with_max_bytes(max_input_bytes);
    let series = SeriesLoader::new(corpus)
        .with_tie_method(tie_method)
        .load(&args.files, &args.words)
        .context("failed to load dated distributions")?;

    if global_json {
        let output = TrendOutput {
            tie_method,
            dates: args.files.len(),
            series,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for entry in &series {
        println!("{}", entry.token.bold());
        if !entry.is_found() {
            println!("  {}", "(not found)".dimmed());
            continue;
        }
        for point in &entry.points {
            println!(
                "  {}  {:>8}  {:>8}  {:.6}",
                point.date,
                point.count,
                format_rank(point.rank),
                point.freq
            );
        }
    }
    Ok(())
}

//! Rank command: the rank table of a single distribution.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use turbulence_core::{CorpusFormat, ListShape, RankedToken, TieMethod, rank_distribution};

use super::load_distribution;

/// Arguments for the `rank` subcommand.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Distribution file.
    pub file: Utf8PathBuf,

    /// Print at most N rows.
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Tie handling for equal counts.
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
struct RankOutput<'a> {
    file: &'a str,
    tie_method: TieMethod,
    total: usize,
    rows: Vec<RankedToken>,
}

/// Print the ranks of one distribution, best first.
#[instrument(name = "cmd_rank", skip_all, fields(file = %args.file))]
pub fn cmd_rank(
    args: RankArgs,
    global_json: bool,
    config_ties: TieMethod,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let tie_method = args.ties.unwrap_or(config_ties);
    debug!(limit = ?args.limit, ties = %tie_method, "executing rank command");

    let dist = load_distribution(&args.file, args.format, args.shape, max_input_bytes)?;
    let mut rows = rank_distribution(&dist, tie_method).table();
    let total = rows.len();
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    if global_json {
        let output = RankOutput {
            file: args.file.as_str(),
            tie_method,
            total,
            rows,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} tokens, ties {}",
        args.file.bold(),
        total,
        tie_method
    );
    for row in &rows {
        println!("{:>8}  {:>8}  {}", format_rank(row.rank), row.count, row.token);
    }
    if rows.len() < total {
        println!("{}", format!("... {} more", total - rows.len()).dimmed());
    }
    Ok(())
}

/// Whole ranks print without a fraction.
pub(crate) fn format_rank(rank: f64) -> String {
    if rank.fract() == 0.0 {
        format!("{rank:.0}")
    } else {
        format!("{rank:.1}")
    }
}

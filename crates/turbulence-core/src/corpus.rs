//! Loading one date's distribution from disk.
//!
//! Supported layouts:
//!
//! - **TSV**: the per-day n-gram table, `ngram<TAB>count[<TAB>rank<TAB>freq]`.
//!   A `ngram count rank freq` header line is skipped and repeated n-grams
//!   accumulate.
//!   [`parse_tsv_rows`] keeps the `rank` and `freq` columns for time series.
//! - **JSON**: an object of `{"token": count}`.
//! - **List**: one token per line, read either as a ranking (best first)
//!   or as raw occurrences.

use std::collections::HashMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::distribution::TokenDistribution;
use crate::error::{CorpusError, CorpusResult};

/// On-disk layout of a distribution file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CorpusFormat {
    /// Tab-separated n-gram count table.
    Tsv,
    /// JSON object of token counts.
    Json,
    /// One token per line.
    List,
}

impl CorpusFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()? {
            "tsv" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "txt" | "list" => Some(Self::List),
            _ => None,
        }
    }
}

/// How a list file is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ListShape {
    /// Tokens are unique and ordered best first.
    #[default]
    Ranked,
    /// Each line is one observed occurrence.
    Raw,
}

/// Builder for reading distribution files.
#[derive(Debug, Clone, Default)]
pub struct CorpusLoader {
    format: Option<CorpusFormat>,
    shape: ListShape,
    max_bytes: Option<usize>,
}

impl CorpusLoader {
    /// Loader that infers the format from the file extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a format instead of inferring it.
    pub const fn with_format(mut self, format: Option<CorpusFormat>) -> Self {
        self.format = format;
        self
    }

    /// Set how list files are read.
    pub const fn with_shape(mut self, shape: ListShape) -> Self {
        self.shape = shape;
        self
    }

    /// Refuse files larger than `max_bytes`.
    pub const fn with_max_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Read and parse `path`.
    #[tracing::instrument(skip(self), fields(format = ?self.format))]
    pub fn load(&self, path: &Utf8Path) -> CorpusResult<TokenDistribution> {
        let format = self.resolve_format(path)?;
        let content = self.read(path)?;
        let dist = match format {
            CorpusFormat::Tsv => TokenDistribution::CountMap(parse_tsv(&content, path)?),
            CorpusFormat::Json => TokenDistribution::CountMap(parse_json(&content, path)?),
            CorpusFormat::List => parse_list(&content, self.shape),
        };
        tracing::info!(
            path = %path,
            shape = dist.shape(),
            tokens = dist.len(),
            "distribution loaded"
        );
        Ok(dist)
    }

    /// Read `path` as one date's rows.
    ///
    /// TSV files keep their `rank` and `freq` columns; other formats yield
    /// counts only, ordered by n-gram.
    pub fn load_rows(&self, path: &Utf8Path) -> CorpusResult<Vec<NgramRow>> {
        if self.resolve_format(path)? == CorpusFormat::Tsv {
            return parse_tsv_rows(&self.read(path)?, path);
        }
        let mut rows: Vec<NgramRow> = self
            .load(path)?
            .counts()
            .into_iter()
            .map(|(ngram, count)| NgramRow {
                ngram,
                count,
                rank: None,
                freq: None,
            })
            .collect();
        rows.sort_by(|a, b| a.ngram.cmp(&b.ngram));
        Ok(rows)
    }

    fn resolve_format(&self, path: &Utf8Path) -> CorpusResult<CorpusFormat> {
        self.format
            .or_else(|| CorpusFormat::from_path(path))
            .ok_or_else(|| CorpusError::UnknownFormat(path.to_path_buf()))
    }

    fn read(&self, path: &Utf8Path) -> CorpusResult<String> {
        let io_err = |source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        };
        // Preflight the size before pulling the file into memory.
        let metadata = std::fs::metadata(path.as_std_path()).map_err(io_err)?;
        if let Some(limit) = self.max_bytes
            && metadata.len() > limit as u64
        {
            return Err(CorpusError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit,
            });
        }
        std::fs::read_to_string(path.as_std_path()).map_err(io_err)
    }
}

/// One n-gram of a TSV table, with repeated lines merged.
#[derive(Debug, Clone, PartialEq)]
pub struct NgramRow {
    /// The n-gram.
    pub ngram: String,
    /// Summed count over every line naming the n-gram.
    pub count: u64,
    /// Rank column of the first line that had one.
    pub rank: Option<f64>,
    /// Relative frequency column of the first line that had one.
    pub freq: Option<f64>,
}

/// Parse a tab-separated n-gram table, keeping the optional `rank` and
/// `freq` columns.
///
/// Rows come back in first-seen order.
pub fn parse_tsv_rows(content: &str, path: &Utf8Path) -> CorpusResult<Vec<NgramRow>> {
    let mut rows: Vec<NgramRow> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let ngram = fields.next().unwrap_or_default();
        let count = fields.next().map(str::trim);

        if ngram == "ngram" && count == Some("count") {
            continue;
        }

        let parse_err = |message: String| CorpusError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        };
        let count = count.ok_or_else(|| parse_err("missing count column".to_string()))?;
        let count: u64 = count
            .parse()
            .map_err(|_| parse_err(format!("count is not a non-negative integer: {count:?}")))?;
        let rank = optional_number(fields.next(), "rank").map_err(parse_err)?;
        let freq = optional_number(fields.next(), "freq").map_err(parse_err)?;

        if let Some(row) = seen.get(ngram).and_then(|&at| rows.get_mut(at)) {
            row.count = row
                .count
                .checked_add(count)
                .ok_or_else(|| parse_err("count overflows u64".to_string()))?;
            row.rank = row.rank.or(rank);
            row.freq = row.freq.or(freq);
        } else {
            seen.insert(ngram.to_string(), rows.len());
            rows.push(NgramRow {
                ngram: ngram.to_string(),
                count,
                rank,
                freq,
            });
        }
    }
    Ok(rows)
}

fn optional_number(field: Option<&str>, column: &str) -> Result<Option<f64>, String> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("{column} is not a number: {text:?}")),
    }
}

/// Parse a tab-separated n-gram count table.
///
/// Only the first two columns matter; repeated n-grams accumulate.
pub fn parse_tsv(content: &str, path: &Utf8Path) -> CorpusResult<HashMap<String, u64>> {
    Ok(parse_tsv_rows(content, path)?
        .into_iter()
        .map(|row| (row.ngram, row.count))
        .collect())
}

/// Parse a JSON object of token counts.
pub fn parse_json(content: &str, path: &Utf8Path) -> CorpusResult<HashMap<String, u64>> {
    serde_json::from_str(content).map_err(|source| CorpusError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a one-token-per-line file.
pub fn parse_list(content: &str, shape: ListShape) -> TokenDistribution {
    let tokens: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    match shape {
        ListShape::Ranked => TokenDistribution::RankedList(tokens),
        ListShape::Raw => TokenDistribution::RawOccurrences(tokens),
    }
}

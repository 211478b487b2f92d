//! Per-token time series over dated distribution files.
//!
//! Each file is one date, labelled by its stem (`2008-01-02.tsv` is
//! `2008-01-02`). A token's point on a date carries its count, rank and
//! relative frequency. Rank and frequency come from the TSV `rank` and
//! `freq` columns when a file has them and are derived from the day's
//! counts otherwise. Dates on which a token has no count are left out of
//! its series.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::corpus::{CorpusLoader, NgramRow};
use crate::distribution::TokenDistribution;
use crate::error::CorpusResult;
use crate::ranks::{TieMethod, rank_distribution};

/// A token's standing on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesPoint {
    /// Date label.
    pub date: String,
    /// Count on that date.
    pub count: u64,
    /// Rank on that date (1 = most frequent).
    pub rank: f64,
    /// Share of the date's total count.
    pub freq: f64,
}

/// One token across every date it was seen on, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TokenSeries {
    /// The token.
    pub token: String,
    /// Points in ascending date-label order; empty when never seen.
    pub points: Vec<SeriesPoint>,
}

impl TokenSeries {
    /// Whether the token was seen on any date.
    pub fn is_found(&self) -> bool {
        !self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Standing {
    count: u64,
    rank: f64,
    freq: f64,
}

/// Every observed token of one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySnapshot {
    date: String,
    standings: HashMap<String, Standing>,
}

impl DaySnapshot {
    /// Build a snapshot from table rows.
    ///
    /// Rows without a rank are ranked among the date's rows with `method`;
    /// rows without a frequency get `count / total`.
    pub fn from_rows(date: impl Into<String>, rows: Vec<NgramRow>, method: TieMethod) -> Self {
        let counts: HashMap<String, u64> =
            rows.iter().map(|row| (row.ngram.clone(), row.count)).collect();
        let computed = rank_distribution(&TokenDistribution::CountMap(counts), method);
        let total: f64 = rows.iter().map(|row| row.count as f64).sum();

        let standings = rows
            .into_iter()
            .filter(|row| row.count > 0)
            .filter_map(|row| {
                let rank = row.rank.or_else(|| computed.rank(&row.ngram))?;
                let freq = row.freq.unwrap_or(row.count as f64 / total);
                Some((
                    row.ngram,
                    Standing {
                        count: row.count,
                        rank,
                        freq,
                    },
                ))
            })
            .collect();

        Self {
            date: date.into(),
            standings,
        }
    }

    /// Build a snapshot from an in-memory distribution.
    pub fn from_distribution(
        date: impl Into<String>,
        x: &TokenDistribution,
        method: TieMethod,
    ) -> Self {
        let rows = x
            .counts()
            .into_iter()
            .map(|(ngram, count)| NgramRow {
                ngram,
                count,
                rank: None,
                freq: None,
            })
            .collect();
        Self::from_rows(date, rows, method)
    }

    /// The date label.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Number of tokens observed on this date.
    pub fn len(&self) -> usize {
        self.standings.len()
    }

    /// Whether nothing was observed on this date.
    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }

    /// The token's point on this date, if it was observed.
    pub fn point(&self, token: &str) -> Option<SeriesPoint> {
        self.standings.get(token).map(|s| SeriesPoint {
            date: self.date.clone(),
            count: s.count,
            rank: s.rank,
            freq: s.freq,
        })
    }
}

/// Collect each token's points across `days`, ordered by date label.
pub fn token_series(days: &[DaySnapshot], tokens: &[String]) -> Vec<TokenSeries> {
    let mut ordered: Vec<&DaySnapshot> = days.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date));

    tokens
        .iter()
        .map(|token| TokenSeries {
            token: token.clone(),
            points: ordered.iter().filter_map(|day| day.point(token)).collect(),
        })
        .collect()
}

/// Date label of a file: its stem.
pub fn date_label(path: &Utf8Path) -> String {
    path.file_stem().unwrap_or(path.as_str()).to_string()
}

/// Loads dated files into snapshots and series.
#[derive(Debug, Clone, Default)]
pub struct SeriesLoader {
    corpus: CorpusLoader,
    tie_method: TieMethod,
}

impl SeriesLoader {
    /// Wrap a corpus loader; ties default to [`TieMethod::Average`].
    pub fn new(corpus: CorpusLoader) -> Self {
        Self {
            corpus,
            tie_method: TieMethod::default(),
        }
    }

    /// Tie handling for dates whose files carry no rank column.
    pub const fn with_tie_method(mut self, method: TieMethod) -> Self {
        self.tie_method = method;
        self
    }

    /// Load one dated file.
    pub fn load_day(&self, path: &Utf8Path) -> CorpusResult<DaySnapshot> {
        let rows = self.corpus.load_rows(path)?;
        let day = DaySnapshot::from_rows(date_label(path), rows, self.tie_method);
        debug!(date = %day.date(), tokens = day.len(), "loaded day");
        Ok(day)
    }

    /// Load every file and collect the series of `tokens`.
    #[instrument(skip_all, fields(files = paths.len(), tokens = tokens.len()))]
    pub fn load(&self, paths: &[Utf8PathBuf], tokens: &[String]) -> CorpusResult<Vec<TokenSeries>> {
        let days = paths
            .iter()
            .map(|path| self.load_day(path))
            .collect::<CorpusResult<Vec<_>>>()?;
        Ok(token_series(&days, tokens))
    }
}

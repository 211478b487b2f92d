//! Rank building over a combined vocabulary.
//!
//! Each side is ranked over the *whole* combined vocabulary: tokens the side
//! never observed get a count of 0 and so share the worst ranks. Rank 1 is
//! the most frequent token.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::distribution::TokenDistribution;
use crate::error::{DivergenceError, DivergenceResult};
use crate::vocabulary::CombinedVocabulary;

/// How tokens with equal counts are ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TieMethod {
    /// Tied tokens share the mean of the positions they occupy.
    #[default]
    Average,
    /// Tied tokens get distinct positions, in lexicographic token order.
    Ordinal,
}

impl TieMethod {
    /// Returns the tie method as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Ordinal => "ordinal",
        }
    }
}

impl std::fmt::Display for TieMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a rank table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedToken {
    /// The token.
    pub token: String,
    /// Fractional rank (1 = most frequent).
    pub rank: f64,
    /// Count on this side (0 when only the other side saw it).
    pub count: u64,
}

/// Token→rank mapping for one side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct RankMap {
    ranks: BTreeMap<String, f64>,
    counts: BTreeMap<String, u64>,
    own_len: usize,
}

impl RankMap {
    /// Rank of `token`, if it is part of the vocabulary.
    pub fn rank(&self, token: &str) -> Option<f64> {
        self.ranks.get(token).copied()
    }

    /// Count of `token` on this side.
    pub fn count(&self, token: &str) -> Option<u64> {
        self.counts.get(token).copied()
    }

    /// Whether this side actually observed `token`.
    pub fn observed(&self, token: &str) -> bool {
        self.count(token).is_some_and(|c| c > 0)
    }

    /// Tokens this side observed (count above 0); `N` for this side.
    ///
    /// A `CountMap` entry with count 0 is treated like a token the side
    /// never saw, both here and in the normalization sum.
    pub const fn own_len(&self) -> usize {
        self.own_len
    }

    /// Size of the ranked vocabulary.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Whether nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// `(token, rank)` pairs in lexicographic token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ranks.iter().map(|(t, r)| (t.as_str(), *r))
    }

    /// Tokens present in `self` but not in `other`.
    pub fn missing_from(&self, other: &Self) -> Vec<String> {
        self.ranks
            .keys()
            .filter(|t| !other.ranks.contains_key(*t))
            .cloned()
            .collect()
    }

    /// Rows ordered best rank first.
    pub fn table(&self) -> Vec<RankedToken> {
        let mut rows: Vec<RankedToken> = self
            .ranks
            .iter()
            .map(|(token, rank)| RankedToken {
                token: token.clone(),
                rank: *rank,
                count: self.counts.get(token).copied().unwrap_or(0),
            })
            .collect();
        rows.sort_by(|a, b| a.rank.total_cmp(&b.rank));
        rows
    }
}

/// Rank a distribution over `vocab`.
///
/// Every token of `x` must belong to `vocab`; a token outside it means the
/// vocabulary was built from different inputs and yields
/// [`DivergenceError::DomainMismatch`].
#[tracing::instrument(skip_all, fields(shape = x.shape(), vocab = vocab.len(), ties = %method))]
pub fn build_ranks(
    x: &TokenDistribution,
    vocab: &CombinedVocabulary,
    method: TieMethod,
) -> DivergenceResult<RankMap> {
    let mut accumulator: BTreeMap<String, u64> =
        vocab.iter().map(|t| (t.to_string(), 0)).collect();

    let mut outside = Vec::new();
    for (token, count) in x.counts() {
        match accumulator.get_mut(&token) {
            Some(slot) => *slot += count,
            None => outside.push(token),
        }
    }
    if !outside.is_empty() {
        outside.sort();
        return Err(DivergenceError::DomainMismatch {
            left_only: outside,
            right_only: Vec::new(),
        });
    }

    let ranks = rank_counts(&accumulator, method);
    let own_len = observed_len(&accumulator);
    tracing::debug!(own_len, ranked = ranks.len(), "ranks built");

    Ok(RankMap {
        ranks,
        counts: accumulator,
        own_len,
    })
}

/// Rank a single distribution against its own vocabulary.
pub fn rank_distribution(x: &TokenDistribution, method: TieMethod) -> RankMap {
    let accumulator: BTreeMap<String, u64> = x.counts().into_iter().collect();
    RankMap {
        own_len: observed_len(&accumulator),
        ranks: rank_counts(&accumulator, method),
        counts: accumulator,
    }
}

fn observed_len(counts: &BTreeMap<String, u64>) -> usize {
    counts.values().filter(|&&c| c > 0).count()
}

/// Assign descending-count ranks.
///
/// The input iterates in lexicographic order and the sort is stable, so
/// ordinal ties resolve lexicographically.
fn rank_counts(counts: &BTreeMap<String, u64>, method: TieMethod) -> BTreeMap<String, f64> {
    let mut order: Vec<(&str, u64)> = counts.iter().map(|(t, c)| (t.as_str(), *c)).collect();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let mut ranks = BTreeMap::new();
    match method {
        TieMethod::Ordinal => {
            for (pos, (token, _)) in order.iter().enumerate() {
                ranks.insert((*token).to_string(), (pos + 1) as f64);
            }
        }
        TieMethod::Average => {
            let mut start = 0;
            while start < order.len() {
                let count = order[start].1;
                let end = order[start..]
                    .iter()
                    .position(|(_, c)| *c != count)
                    .map_or(order.len(), |offset| start + offset);
                // positions start+1 ..= end
                let shared = (start + 1 + end) as f64 / 2.0;
                for (token, _) in &order[start..end] {
                    ranks.insert((*token).to_string(), shared);
                }
                start = end;
            }
        }
    }
    ranks
}

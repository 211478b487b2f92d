//! Token distributions accepted by the divergence pipeline.
//!
//! A distribution describes which n-grams were observed on one date and how
//! prominent each was. Callers say explicitly which shape they hold; the
//! rank builder normalizes every shape to a token→count table.

use std::collections::{BTreeSet, HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "shape", content = "tokens", rename_all = "snake_case")]
pub enum TokenDistribution {
    /// Unique tokens ordered best to worst; rank is the position.
    RankedList(Vec<String>),
    /// Raw occurrences, one entry per observation.
    RawOccurrences(Vec<String>),
    /// Explicit token→count table.
    CountMap(HashMap<String, u64>),
}

impl TokenDistribution {
    /// Pick a shape for an untagged sequence.
    ///
    /// A sequence without duplicates is read as a ranked list, anything else
    /// as raw occurrences. This is ambiguous: raw data in which every token
    /// occurs once is indistinguishable from a ranking. Prefer constructing
    /// the variant directly.
    pub fn infer(tokens: Vec<String>) -> Self {
        let unique = {
            let mut seen = HashSet::with_capacity(tokens.len());
            tokens.iter().all(|t| seen.insert(t.as_str()))
        };
        if unique {
            Self::RankedList(tokens)
        } else {
            Self::RawOccurrences(tokens)
        }
    }

    /// Normalize to a token→count table.
    ///
    /// A ranked list of `m` tokens gives position `i` the synthetic count
    /// `m - i`, so counting reproduces the input order. A ranked list with
    /// repeated tokens keeps the weight of the first occurrence.
    pub fn counts(&self) -> HashMap<String, u64> {
        match self {
            Self::RankedList(tokens) => {
                let m = tokens.len() as u64;
                let mut counts = HashMap::with_capacity(tokens.len());
                for (i, token) in tokens.iter().enumerate() {
                    counts.entry(token.clone()).or_insert(m - i as u64);
                }
                counts
            }
            Self::RawOccurrences(tokens) => {
                let mut counts: HashMap<String, u64> = HashMap::new();
                for token in tokens {
                    *counts.entry(token.clone()).or_insert(0) += 1;
                }
                counts
            }
            Self::CountMap(map) => map.clone(),
        }
    }

    /// Distinct tokens of this distribution.
    pub fn tokens(&self) -> BTreeSet<&str> {
        match self {
            Self::RankedList(tokens) | Self::RawOccurrences(tokens) => {
                tokens.iter().map(String::as_str).collect()
            }
            Self::CountMap(map) => map.keys().map(String::as_str).collect(),
        }
    }

    /// Number of distinct tokens (N for this side).
    pub fn len(&self) -> usize {
        match self {
            Self::CountMap(map) => map.len(),
            _ => self.tokens().len(),
        }
    }

    /// Whether the distribution holds no tokens.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::RankedList(tokens) | Self::RawOccurrences(tokens) => tokens.is_empty(),
            Self::CountMap(map) => map.is_empty(),
        }
    }

    /// Short name of the shape, for logs.
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::RankedList(_) => "ranked_list",
            Self::RawOccurrences(_) => "raw_occurrences",
            Self::CountMap(_) => "count_map",
        }
    }
}

impl From<HashMap<String, u64>> for TokenDistribution {
    fn from(map: HashMap<String, u64>) -> Self {
        Self::CountMap(map)
    }
}

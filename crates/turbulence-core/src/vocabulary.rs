//! Combined vocabulary of two distributions.

use std::collections::BTreeSet;

use crate::distribution::TokenDistribution;

/// Every distinct token observed on either side, in lexicographic order.
///
/// The ordering is what later stages fall back on when counts or
/// magnitudes tie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedVocabulary {
    tokens: BTreeSet<String>,
}

impl CombinedVocabulary {
    /// Union of the token sets of both distributions.
    #[tracing::instrument(skip_all, fields(left = x1.shape(), right = x2.shape()))]
    pub fn from_pair(x1: &TokenDistribution, x2: &TokenDistribution) -> Self {
        let tokens: BTreeSet<String> = x1
            .tokens()
            .union(&x2.tokens())
            .map(|t| (*t).to_string())
            .collect();
        tracing::debug!(size = tokens.len(), "combined vocabulary built");
        Self { tokens }
    }

    /// Vocabulary of a single distribution.
    pub fn from_single(x: &TokenDistribution) -> Self {
        Self {
            tokens: x.tokens().into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of tokens in the vocabulary.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `token` belongs to the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Tokens in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

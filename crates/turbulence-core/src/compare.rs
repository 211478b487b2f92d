//! End-to-end comparison of two distributions.
//!
//! Runs the four stages (vocabulary, ranks, scoring, hot words) and packages
//! the result. Every call is independent; nothing is cached between calls.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::distribution::TokenDistribution;
use crate::divergence::{self, DEFAULT_ALPHA};
use crate::error::DivergenceResult;
use crate::hot_words::{self, DEFAULT_TOP_K, HotWord};
use crate::ranks::{TieMethod, build_ranks};
use crate::stopwords::StopwordSet;
use crate::vocabulary::CombinedVocabulary;

/// Tunables for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompareOptions {
    /// Exponent applied to ranks; must be finite and > 0.
    pub alpha: f64,
    /// Hot words kept per side.
    pub top_k: usize,
    /// Tie handling for equal counts.
    pub tie_method: TieMethod,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            top_k: DEFAULT_TOP_K,
            tie_method: TieMethod::Average,
        }
    }
}

/// Result of comparing two distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DivergenceReport {
    /// Alpha used for scoring.
    pub alpha: f64,
    /// Hot-word limit per side.
    pub top_k: usize,
    /// Tie handling used while ranking.
    pub tie_method: TieMethod,
    /// Tokens observed (count above 0) on side 1.
    pub n1: usize,
    /// Tokens observed (count above 0) on side 2.
    pub n2: usize,
    /// Size of the combined vocabulary.
    pub vocabulary: usize,
    /// Normalized rank turbulence divergence in `[0, 1]`.
    pub divergence: f64,
    /// Hot words filed under side 1.
    pub side1: Vec<HotWord>,
    /// Hot words filed under side 2.
    pub side2: Vec<HotWord>,
}

/// Compare two distributions and extract hot words for both sides.
#[tracing::instrument(skip(x1, x2, stopwords), fields(alpha = options.alpha, top_k = options.top_k))]
pub fn compare(
    x1: &TokenDistribution,
    x2: &TokenDistribution,
    options: &CompareOptions,
    stopwords: &StopwordSet,
) -> DivergenceResult<DivergenceReport> {
    divergence::validate_alpha(options.alpha)?;

    let vocab = CombinedVocabulary::from_pair(x1, x2);
    let r1 = build_ranks(x1, &vocab, options.tie_method)?;
    let r2 = build_ranks(x2, &vocab, options.tie_method)?;

    let entries = divergence::score(&r1, &r2, options.alpha)?;
    let norm = divergence::normalization(&r1, &r2, options.alpha)?;
    let d = divergence::divergence(&entries, norm, options.alpha);
    let hot = hot_words::extract(&entries, stopwords, options.top_k);

    tracing::info!(
        n1 = r1.own_len(),
        n2 = r2.own_len(),
        vocabulary = vocab.len(),
        divergence = d,
        "comparison complete"
    );

    Ok(DivergenceReport {
        alpha: options.alpha,
        top_k: options.top_k,
        tie_method: options.tie_method,
        n1: r1.own_len(),
        n2: r2.own_len(),
        vocabulary: vocab.len(),
        divergence: d,
        side1: hot.side1,
        side2: hot.side2,
    })
}

/// Hot words for both sides, returned as `(side2, side1)`.
///
/// The swapped order is what the dashboard layer expects: the list for the
/// later date comes first. Use [`compare`] for a labelled result.
pub fn rank_turbulence_divergence(
    x1: &TokenDistribution,
    x2: &TokenDistribution,
    alpha: f64,
    top_k: usize,
    stopwords: &StopwordSet,
) -> DivergenceResult<(Vec<HotWord>, Vec<HotWord>)> {
    let options = CompareOptions {
        alpha,
        top_k,
        ..CompareOptions::default()
    };
    let report = compare(x1, x2, &options, stopwords)?;
    Ok((report.side2, report.side1))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use super::*;
    use crate::error::DivergenceError;

    fn count_map(pairs: &[(&str, u64)]) -> TokenDistribution {
        TokenDistribution::CountMap(
            pairs
                .iter()
                .map(|(t, c)| ((*t).to_string(), *c))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn names() -> (TokenDistribution, TokenDistribution) {
        (
            count_map(&[("mary", 6), ("jane", 3), ("chelsea", 2), ("ann", 1)]),
            count_map(&[("ann", 5), ("jane", 4), ("barb", 2), ("crystal", 1)]),
        )
    }

    #[test]
    fn names_example_end_to_end() {
        let (x1, x2) = names();
        let (hot2, hot1) =
            rank_turbulence_divergence(&x1, &x2, 1.0 / 3.0, 2, &StopwordSet::empty()).unwrap();

        let vocab: BTreeSet<&str> = ["mary", "jane", "chelsea", "ann", "barb", "crystal"]
            .into_iter()
            .collect();
        for list in [&hot1, &hot2] {
            assert!(!list.is_empty());
            assert!(list.len() <= 2);
            assert!(list.iter().all(|h| vocab.contains(h.name.as_str())));
            assert!(list.iter().all(|h| h.value >= 10));
        }
    }

    #[test]
    fn output_order_is_swapped() {
        let (x1, x2) = names();
        let stopwords = StopwordSet::empty();
        let report = compare(&x1, &x2, &CompareOptions::default(), &stopwords).unwrap();
        let (first, second) =
            rank_turbulence_divergence(&x1, &x2, DEFAULT_ALPHA, DEFAULT_TOP_K, &stopwords).unwrap();

        assert_eq!(first, report.side2);
        assert_eq!(second, report.side1);
    }

    #[test]
    fn same_distribution_gives_empty_lists() {
        let (x1, _) = names();
        for alpha in [0.1, 1.0 / 3.0, 1.0, 5.0] {
            let (a, b) =
                rank_turbulence_divergence(&x1, &x1, alpha, 10, &StopwordSet::empty()).unwrap();
            assert!(a.is_empty());
            assert!(b.is_empty());
        }
        let report = compare(&x1, &x1, &CompareOptions::default(), &StopwordSet::empty()).unwrap();
        assert_eq!(report.divergence, 0.0);
    }

    #[test]
    fn shapes_agree_on_names_example() {
        let ranked = (
            TokenDistribution::RankedList(
                ["mary", "jane", "chelsea", "ann"].map(String::from).to_vec(),
            ),
            TokenDistribution::RankedList(
                ["ann", "jane", "barb", "crystal"].map(String::from).to_vec(),
            ),
        );
        let raw = (
            TokenDistribution::RawOccurrences(
                [
                    "mary", "mary", "mary", "mary", "mary", "mary", "jane", "jane", "jane",
                    "chelsea", "chelsea", "ann",
                ]
                .map(String::from)
                .to_vec(),
            ),
            TokenDistribution::RawOccurrences(
                [
                    "ann", "ann", "ann", "ann", "ann", "jane", "jane", "jane", "jane", "barb",
                    "barb", "crystal",
                ]
                .map(String::from)
                .to_vec(),
            ),
        );
        let stopwords = StopwordSet::empty();
        let options = CompareOptions::default();
        let from_ranked = compare(&ranked.0, &ranked.1, &options, &stopwords).unwrap();
        let from_raw = compare(&raw.0, &raw.1, &options, &stopwords).unwrap();

        assert_eq!(from_ranked.side1, from_raw.side1);
        assert_eq!(from_ranked.side2, from_raw.side2);
        assert!((from_ranked.divergence - from_raw.divergence).abs() < 1e-12);
    }

    #[test]
    fn truncates_to_one_per_side() {
        let x1 = count_map(&[("a", 9), ("b", 8), ("c", 7), ("d", 1)]);
        let x2 = count_map(&[("e", 9), ("f", 8), ("g", 7), ("d", 50)]);
        let report = compare(
            &x1,
            &x2,
            &CompareOptions {
                top_k: 1,
                ..CompareOptions::default()
            },
            &StopwordSet::empty(),
        )
        .unwrap();
        assert_eq!(report.side1.len(), 1);
        assert_eq!(report.side2.len(), 1);
    }

    #[test]
    fn stopwords_are_filtered_end_to_end() {
        let x1 = count_map(&[("the", 100), ("cat", 10), ("!", 50)]);
        let x2 = count_map(&[("the", 1), ("dog", 10), ("!", 2)]);
        let stopwords = StopwordSet::from_list(["the"]);
        let report = compare(&x1, &x2, &CompareOptions::default(), &stopwords).unwrap();

        let names: Vec<&str> = report
            .side1
            .iter()
            .chain(&report.side2)
            .map(|h| h.name.as_str())
            .collect();
        assert!(!names.contains(&"the"));
        assert!(!names.contains(&"!"));
        assert!(names.contains(&"cat"));
    }

    #[test]
    fn report_counts_sides_before_padding() {
        let (x1, x2) = names();
        let report = compare(&x1, &x2, &CompareOptions::default(), &StopwordSet::empty()).unwrap();
        assert_eq!(report.n1, 4);
        assert_eq!(report.n2, 4);
        assert_eq!(report.vocabulary, 6);
        assert!(report.divergence > 0.0 && report.divergence <= 1.0);
    }

    #[test]
    fn zero_count_entries_do_not_count_as_observed() {
        let (x1, x2) = names();
        let padded = count_map(&[
            ("mary", 6),
            ("jane", 3),
            ("chelsea", 2),
            ("ann", 1),
            ("crystal", 0),
        ]);
        let plain = compare(&x1, &x2, &CompareOptions::default(), &StopwordSet::empty()).unwrap();
        let report =
            compare(&padded, &x2, &CompareOptions::default(), &StopwordSet::empty()).unwrap();

        assert_eq!(report.n1, 4);
        assert_eq!(report.vocabulary, 6);
        // crystal already sits in the shared vocabulary at count 0
        assert_eq!(report.divergence, plain.divergence);
        assert_eq!(report.side1, plain.side1);
    }

    #[test]
    fn invalid_alpha_fails_fast() {
        let (x1, x2) = names();
        let err =
            rank_turbulence_divergence(&x1, &x2, 0.0, 5, &StopwordSet::empty()).unwrap_err();
        assert_eq!(err, DivergenceError::InvalidAlpha(0.0));
    }

    #[test]
    fn report_serializes_word_cloud_fields() {
        let (x1, x2) = names();
        let report = compare(&x1, &x2, &CompareOptions::default(), &StopwordSet::empty()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["side1"][0]["name"].is_string());
        assert!(json["side1"][0]["value"].is_u64());
        assert_eq!(json["tie_method"], "average");
    }
}

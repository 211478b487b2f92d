//! Rank turbulence divergence scoring.
//!
//! Per token `τ` with ranks `r1`, `r2`:
//!
//! `δ(τ) = | r1^-α − r2^-α | ^ (1/(α+1))`
//!
//! The scalar divergence sums the contributions and divides by the value the
//! sum would take if the two sides shared no tokens at all:
//!
//! `D = (α+1)/α · Σ δ(τ) / N`, where
//! `N = (α+1)/α · [ Σ_{τ∈R1} |r1^-α − (N1 + N2/2)^-α|^(1/(α+1))
//!                + Σ_{τ∈R2} |(N2 + N1/2)^-α − r2^-α|^(1/(α+1)) ]`
//!
//! Small α weights deep ranks almost as much as the top; large α focuses on
//! the head of each ranking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DivergenceError, DivergenceResult};
use crate::ranks::RankMap;

/// Default alpha used by the dashboard.
pub const DEFAULT_ALPHA: f64 = 1.0 / 3.0;

/// Which side of the comparison a token leans towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The first distribution.
    One,
    /// The second distribution.
    Two,
}

/// Contribution of one token to the divergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DivergenceEntry {
    /// The token.
    pub token: String,
    /// `|r1^-α − r2^-α|^(1/(α+1))`, never negative.
    pub magnitude: f64,
    /// Bucket the token is reported under.
    pub favors: Side,
    /// Rank on side 1.
    pub rank1: f64,
    /// Rank on side 2.
    pub rank2: f64,
}

/// Reject alpha values the formula cannot use.
pub fn validate_alpha(alpha: f64) -> DivergenceResult<()> {
    if alpha.is_finite() && alpha > 0.0 {
        Ok(())
    } else {
        Err(DivergenceError::InvalidAlpha(alpha))
    }
}

/// Score every token of the shared vocabulary.
///
/// Entries come back sorted by magnitude, largest first; equal magnitudes
/// keep lexicographic token order. A token is filed under [`Side::One`]
/// when its side-1 rank number is strictly larger than its side-2 rank
/// number, and under [`Side::Two`] otherwise (equal ranks included).
#[tracing::instrument(skip(r1, r2), fields(vocab = r1.len()))]
pub fn score(r1: &RankMap, r2: &RankMap, alpha: f64) -> DivergenceResult<Vec<DivergenceEntry>> {
    validate_alpha(alpha)?;
    ensure_same_domain(r1, r2)?;

    let exponent = 1.0 / (alpha + 1.0);
    let mut entries: Vec<DivergenceEntry> = r1
        .iter()
        .filter_map(|(token, rank1)| {
            let rank2 = r2.rank(token)?;
            let magnitude = (rank1.powf(-alpha) - rank2.powf(-alpha))
                .abs()
                .powf(exponent);
            let favors = if rank1 > rank2 { Side::One } else { Side::Two };
            Some(DivergenceEntry {
                token: token.to_string(),
                magnitude,
                favors,
                rank1,
                rank2,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    tracing::debug!(
        entries = entries.len(),
        top = entries.first().map(|e| e.token.as_str()),
        "divergence scored"
    );
    Ok(entries)
}

/// Normalization factor `N` for the scalar divergence.
///
/// Only tokens a side actually observed contribute to that side's sum.
pub fn normalization(r1: &RankMap, r2: &RankMap, alpha: f64) -> DivergenceResult<f64> {
    validate_alpha(alpha)?;

    let exponent = 1.0 / (alpha + 1.0);
    let n1 = r1.own_len() as f64;
    let n2 = r2.own_len() as f64;
    let tail1 = (n1 + n2 / 2.0).powf(-alpha);
    let tail2 = (n2 + n1 / 2.0).powf(-alpha);

    let side1: f64 = r1
        .iter()
        .filter(|(token, _)| r1.observed(token))
        .map(|(_, rank)| (rank.powf(-alpha) - tail1).abs().powf(exponent))
        .sum();
    let side2: f64 = r2
        .iter()
        .filter(|(token, _)| r2.observed(token))
        .map(|(_, rank)| (tail2 - rank.powf(-alpha)).abs().powf(exponent))
        .sum();

    Ok((alpha + 1.0) / alpha * (side1 + side2))
}

/// Scalar rank turbulence divergence in `[0, 1]`.
///
/// Returns 0 when `norm` is 0 (nothing was observed on either side).
/// Padding ranks for unobserved tokens sit half a rank below the disjoint
/// reference, so fully disjoint inputs can overshoot slightly; the result
/// is capped at 1.
pub fn divergence(entries: &[DivergenceEntry], norm: f64, alpha: f64) -> f64 {
    if norm <= 0.0 {
        return 0.0;
    }
    let total: f64 = entries.iter().map(|e| e.magnitude).sum();
    ((alpha + 1.0) / alpha * total / norm).min(1.0)
}

fn ensure_same_domain(r1: &RankMap, r2: &RankMap) -> DivergenceResult<()> {
    let left_only = r1.missing_from(r2);
    let right_only = r2.missing_from(r1);
    if left_only.is_empty() && right_only.is_empty() {
        Ok(())
    } else {
        tracing::error!(
            left_only = left_only.len(),
            right_only = right_only.len(),
            "rank maps span different vocabularies"
        );
        Err(DivergenceError::DomainMismatch {
            left_only,
            right_only,
        })
    }
}

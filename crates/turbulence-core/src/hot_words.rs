//! Hot-word extraction.
//!
//! Splits scored tokens into the two sides they lean towards, keeps the
//! strongest `top_k` of each and turns their magnitudes into integer
//! weights for word-cloud sizing. The weakest kept token of a side always
//! gets weight 10; the others scale proportionally.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::divergence::{DivergenceEntry, Side};
use crate::stopwords::StopwordSet;

/// Default number of hot words per side.
pub const DEFAULT_TOP_K: usize = 30;

/// Weight given to the smallest retained magnitude of a side.
const BASE_WEIGHT: f64 = 10.0;

/// A token worth highlighting, with its display weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HotWord {
    /// The token.
    pub name: String,
    /// Display weight, at least 10.
    pub value: u32,
}

/// Hot words for both sides, strongest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HotWords {
    /// Tokens filed under side 1.
    pub side1: Vec<HotWord>,
    /// Tokens filed under side 2.
    pub side2: Vec<HotWord>,
}

/// Pick the top `top_k` hot words of each side from `entries`.
///
/// `entries` must be ordered by magnitude, largest first, as returned by
/// [`crate::divergence::score`]. Stopwords, single punctuation characters
/// and zero-magnitude tokens are skipped. A side with no qualifying token
/// comes back empty.
#[tracing::instrument(skip(entries, stopwords), fields(entries = entries.len()))]
pub fn extract(entries: &[DivergenceEntry], stopwords: &StopwordSet, top_k: usize) -> HotWords {
    let mut bucket1: Vec<&DivergenceEntry> = Vec::new();
    let mut bucket2: Vec<&DivergenceEntry> = Vec::new();

    for entry in entries {
        if entry.magnitude <= 0.0 || stopwords.is_excluded(&entry.token) {
            continue;
        }
        match entry.favors {
            Side::One => bucket1.push(entry),
            Side::Two => bucket2.push(entry),
        }
        if bucket1.len() > top_k && bucket2.len() > top_k {
            break;
        }
    }

    bucket1.truncate(top_k);
    bucket2.truncate(top_k);

    let hot = HotWords {
        side1: rescale(&bucket1),
        side2: rescale(&bucket2),
    };
    tracing::debug!(
        side1 = hot.side1.len(),
        side2 = hot.side2.len(),
        "hot words extracted"
    );
    hot
}

/// Weight each entry as `ceil(magnitude / min_magnitude * 10)`.
fn rescale(bucket: &[&DivergenceEntry]) -> Vec<HotWord> {
    let Some(min) = bucket
        .iter()
        .map(|e| e.magnitude)
        .min_by(f64::total_cmp)
    else {
        return Vec::new();
    };

    bucket
        .iter()
        .map(|entry| HotWord {
            name: entry.token.clone(),
            value: weight(entry.magnitude, min),
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn weight(magnitude: f64, min: f64) -> u32 {
    (magnitude / min * BASE_WEIGHT)
        .ceil()
        .min(f64::from(u32::MAX)) as u32
}

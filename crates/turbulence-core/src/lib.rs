//! Core library for turbulence.
//!
//! Compares the rank-frequency distributions of n-grams seen on two dates
//! and reports the tokens that moved most, each with an integer weight for
//! word-cloud sizing.
//!
//! # Modules
//!
//! - [`distribution`] - Input distributions (ranked list, raw occurrences, counts)
//! - [`vocabulary`] - Union of the tokens of both sides
//! - [`ranks`] - Fractional and ordinal ranking over a vocabulary
//! - [`divergence`] - Per-token rank turbulence and the normalized scalar
//! - [`hot_words`] - Per-side top-k selection and weight rescaling
//! - [`compare`] - The full pipeline in one call
//! - [`stopwords`] - Stopword sets
//! - [`corpus`] - Reading distributions from disk
//! - [`series`] - Per-token time series over dated files
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use turbulence_core::{StopwordSet, TokenDistribution, rank_turbulence_divergence};
//!
//! let x1 = TokenDistribution::RankedList(vec!["mary".into(), "jane".into(), "ann".into()]);
//! let x2 = TokenDistribution::RankedList(vec!["ann".into(), "jane".into(), "barb".into()]);
//!
//! let (side2, side1) =
//!     rank_turbulence_divergence(&x1, &x2, 1.0 / 3.0, 30, &StopwordSet::empty())
//!         .expect("alpha is valid");
//! assert!(side1.iter().chain(&side2).all(|word| word.value >= 10));
//! ```
#![deny(unsafe_code)]

pub mod compare;
pub mod config;
pub mod corpus;
pub mod distribution;
pub mod divergence;
pub mod error;
pub mod hot_words;
pub mod ranks;
pub mod series;
pub mod stopwords;
pub mod vocabulary;

pub use compare::{CompareOptions, DivergenceReport, compare, rank_turbulence_divergence};
pub use config::{Config, ConfigLoader, ConfigSources, DEFAULT_MAX_INPUT_BYTES, LogLevel};
pub use corpus::{CorpusFormat, CorpusLoader, ListShape, NgramRow};
pub use distribution::TokenDistribution;
pub use divergence::{DEFAULT_ALPHA, DivergenceEntry, Side};
pub use error::{
    ConfigError, ConfigResult, CorpusError, CorpusResult, DivergenceError, DivergenceResult,
    StopwordError,
};
pub use hot_words::{DEFAULT_TOP_K, HotWord, HotWords};
pub use ranks::{RankMap, RankedToken, TieMethod, build_ranks, rank_distribution};
pub use series::{DaySnapshot, SeriesLoader, SeriesPoint, TokenSeries, token_series};
pub use stopwords::StopwordSet;
pub use vocabulary::CombinedVocabulary;

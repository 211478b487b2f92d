//! Error types for turbulence-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while computing a divergence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DivergenceError {
    /// The two rank maps do not span the same vocabulary.
    ///
    /// Both maps are built over one combined vocabulary, so this signals a
    /// construction bug upstream rather than bad user input.
    #[error(
        "rank maps cover different vocabularies ({} only on side 1, {} only on side 2)",
        left_only.len(),
        right_only.len()
    )]
    DomainMismatch {
        /// Tokens ranked on side 1 but missing from side 2.
        left_only: Vec<String>,
        /// Tokens ranked on side 2 but missing from side 1.
        right_only: Vec<String>,
    },

    /// Alpha must be a finite number greater than zero.
    #[error("alpha must be finite and greater than 0, got {0}")]
    InvalidAlpha(f64),
}

/// Result type alias using [`DivergenceError`].
pub type DivergenceResult<T> = Result<T, DivergenceError>;

/// Errors that can occur while loading a distribution from disk.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exceeds the configured input limit.
    #[error("input too large: {path} is {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// Offending file.
        path: Utf8PathBuf,
        /// Size on disk.
        size: u64,
        /// Configured limit.
        limit: usize,
    },

    /// A line of a TSV table could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// File being parsed.
        path: Utf8PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A JSON count table could not be decoded.
    #[error("invalid JSON count table in {path}: {source}")]
    Json {
        /// File being decoded.
        path: Utf8PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The file format could not be determined from the extension.
    #[error("cannot infer distribution format of {0}; pass an explicit format")]
    UnknownFormat(Utf8PathBuf),
}

/// Result type alias using [`CorpusError`].
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Errors that can occur while building a stopword set.
#[derive(Error, Debug)]
pub enum StopwordError {
    /// The stopword file could not be read.
    #[error("failed to read stopwords from {path}: {source}")]
    Io {
        /// Stopword file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No built-in list exists for the requested language.
    #[error("no built-in stopword list for language: {0}")]
    UnknownLanguage(String),
}

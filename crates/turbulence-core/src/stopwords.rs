//! Stopword filtering for hot-word extraction.
//!
//! A [`StopwordSet`] is built once at startup and only read afterwards, so
//! it can be shared across threads behind an `Arc` without locking.
//! Matching is exact: n-gram tokens are compared as they appear in the
//! corpus.

use std::collections::HashSet;

use camino::Utf8Path;
use stop_words::{LANGUAGE, get};

use crate::error::StopwordError;

/// Immutable set of tokens never reported as hot words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    /// A set that filters nothing but punctuation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from an explicit word list.
    pub fn from_list<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a word-per-line file. Lines are trimmed; blank lines are skipped.
    #[tracing::instrument(skip_all, fields(path = %path))]
    pub fn from_file(path: &Utf8Path) -> Result<Self, StopwordError> {
        let content =
            std::fs::read_to_string(path.as_std_path()).map_err(|source| StopwordError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let set = Self::from_list(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        tracing::debug!(count = set.len(), "stopwords loaded from file");
        Ok(set)
    }

    /// Built-in list for a language code or English name (`en`, `german`, ...).
    pub fn for_language(language: &str) -> Result<Self, StopwordError> {
        let lang = match language.to_lowercase().as_str() {
            "en" | "english" => LANGUAGE::English,
            "de" | "german" => LANGUAGE::German,
            "fr" | "french" => LANGUAGE::French,
            "es" | "spanish" => LANGUAGE::Spanish,
            "it" | "italian" => LANGUAGE::Italian,
            "pt" | "portuguese" => LANGUAGE::Portuguese,
            "nl" | "dutch" => LANGUAGE::Dutch,
            "ru" | "russian" => LANGUAGE::Russian,
            "sv" | "swedish" => LANGUAGE::Swedish,
            "ar" | "arabic" => LANGUAGE::Arabic,
            _ => return Err(StopwordError::UnknownLanguage(language.to_string())),
        };
        let words: Vec<String> = get(lang);
        Ok(Self::from_list(words))
    }

    /// Add more words to the set.
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(words.into_iter().map(Into::into));
    }

    /// Whether `token` is a listed stopword.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Whether `token` must be kept out of hot-word lists.
    ///
    /// Covers listed stopwords, the empty token and any single ASCII
    /// punctuation character.
    pub fn is_excluded(&self, token: &str) -> bool {
        self.contains(token) || token.is_empty() || is_single_punctuation(token)
    }

    /// Iterate over the listed stopwords in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Number of listed stopwords.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether no stopwords are listed.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_single_punctuation(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_punctuation())
}

//! Token normalization: raw whitespace tokens to canonical headwords.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum headword length in characters, checked before and after suffix stripping.
pub const MIN_HEADWORD_CHARS: usize = 2;

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid non-word regex"));

/// Compiled stopword set and trailing-suffix alternation.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
    suffix_regex: Option<Regex>,
}

impl Normalizer {
    pub fn new(stopwords: &[String], suffixes: &[String]) -> anyhow::Result<Self> {
        let stopwords = stopwords
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let alternatives: Vec<String> = suffixes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(regex::escape)
            .collect();
        let suffix_regex = if alternatives.is_empty() {
            None
        } else {
            let pattern = format!("(?:{})$", alternatives.join("|"));
            let regex = Regex::new(&pattern)
                .map_err(|e| anyhow::anyhow!("invalid suffix alternation `{pattern}`: {e}"))?;
            Some(regex)
        };

        Ok(Self {
            stopwords,
            suffix_regex,
        })
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Map a raw token to its headword, or `None` when the token is rejected.
    pub fn normalize(&self, token: &str) -> Option<String> {
        let clean = NON_WORD_RE.replace_all(token, "");
        if self.is_stopword(&clean) || clean.chars().count() < MIN_HEADWORD_CHARS {
            return None;
        }
        let stem = match &self.suffix_regex {
            Some(re) => re.replace(&clean, "").into_owned(),
            None => clean.into_owned(),
        };
        if stem.chars().count() < MIN_HEADWORD_CHARS || self.is_stopword(&stem) {
            return None;
        }
        Some(stem)
    }
}

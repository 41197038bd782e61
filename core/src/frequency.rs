//! Headword discovery and occurrence counting.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::normalize::Normalizer;

/// Strategy for locating a headword inside the full text.
pub trait OccurrenceScanner {
    /// Byte offsets where `word` starts, left to right, non-overlapping.
    fn positions(&self, text: &str, word: &str) -> Vec<usize>;

    fn count(&self, text: &str, word: &str) -> usize {
        self.positions(text, word).len()
    }
}

/// Literal substring scan. Over-counts headwords embedded in longer words.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringScanner;

impl OccurrenceScanner for SubstringScanner {
    fn positions(&self, text: &str, word: &str) -> Vec<usize> {
        if word.is_empty() {
            return Vec::new();
        }
        text.match_indices(word).map(|(idx, _)| idx).collect()
    }
}

/// Only counts occurrences that begin a token. Trailing suffixes are still allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBoundaryScanner;

impl OccurrenceScanner for TokenBoundaryScanner {
    fn positions(&self, text: &str, word: &str) -> Vec<usize> {
        SubstringScanner
            .positions(text, word)
            .into_iter()
            .filter(|&idx| {
                text[..idx]
                    .chars()
                    .next_back()
                    .map_or(true, |prev| !is_word_char(prev))
            })
            .collect()
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Which scanner reconciles headword counts against the text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    Substring,
    TokenBoundary,
}

impl Default for ScanMode {
    fn default() -> Self {
        ScanMode::Substring
    }
}

impl ScanMode {
    pub fn scanner(self) -> Box<dyn OccurrenceScanner + Send + Sync> {
        match self {
            ScanMode::Substring => Box::new(SubstringScanner),
            ScanMode::TokenBoundary => Box::new(TokenBoundaryScanner),
        }
    }
}

/// Headword counts for one text plus the subset selected for highlighting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrequencyReport {
    pub total_tokens: usize,
    pub counts: BTreeMap<String, usize>,
    /// Target headwords in order of first appearance.
    pub targets: Vec<String>,
}

impl FrequencyReport {
    pub fn count(&self, headword: &str) -> usize {
        self.counts.get(headword).copied().unwrap_or(0)
    }

    pub fn is_target(&self, headword: &str) -> bool {
        self.targets.iter().any(|t| t == headword)
    }

    /// Targets with their counts, most frequent first.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut rows: Vec<(String, usize)> = self
            .targets
            .iter()
            .map(|t| (t.clone(), self.count(t)))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }
}

/// Distinct headwords of `text` in first-appearance order.
pub fn candidate_headwords(normalizer: &Normalizer, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for token in text.split_whitespace() {
        if let Some(head) = normalizer.normalize(token) {
            if seen.insert(head.clone()) {
                ordered.push(head);
            }
        }
    }
    ordered
}

pub fn analyze_frequency(
    normalizer: &Normalizer,
    scanner: &dyn OccurrenceScanner,
    text: &str,
    known: &HashSet<String>,
    threshold: usize,
) -> FrequencyReport {
    let candidates = candidate_headwords(normalizer, text);
    let mut counts = BTreeMap::new();
    let mut targets = Vec::new();
    for head in candidates {
        let count = scanner.count(text, &head);
        if count >= threshold || known.contains(&head) {
            targets.push(head.clone());
        }
        counts.insert(head, count);
    }
    FrequencyReport {
        total_tokens: text.split_whitespace().count(),
        counts,
        targets,
    }
}

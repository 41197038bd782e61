//! Occurrence-exact and sentence-level replacement.
//!
//! Occurrences are addressed by `(word, ordinal)` against the text passed in.
//! An ordinal that no longer exists is a no-op, never an error.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::frequency::{OccurrenceScanner, SubstringScanner};

pub const DEFAULT_TERMINATORS: &str = ".?!\n";

/// Sentence enclosing an occurrence. `start..end` is the raw span, terminator included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Sentence {
    /// Span of `text` inside the document, without the surrounding whitespace.
    pub fn trimmed_span(&self, document: &str) -> Range<usize> {
        let Some(raw) = document.get(self.start..self.end) else {
            return self.start..self.end;
        };
        let lead = raw.len() - raw.trim_start().len();
        let trail = raw.len() - raw.trim_end().len();
        let start = self.start + lead;
        start..(self.end - trail).max(start)
    }
}

pub fn occurrence_positions(text: &str, word: &str) -> Vec<usize> {
    SubstringScanner.positions(text, word)
}

fn nth_position(text: &str, word: &str, ordinal: usize) -> Option<usize> {
    occurrence_positions(text, word).get(ordinal).copied()
}

pub fn replace_occurrence(text: &str, word: &str, ordinal: usize, replacement: &str) -> String {
    match nth_position(text, word, ordinal) {
        Some(pos) => splice(text, pos..pos + word.len(), replacement),
        None => text.to_string(),
    }
}

pub fn replace_all(text: &str, word: &str, replacement: &str) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    text.replace(word, replacement)
}

pub fn extract_sentence(
    text: &str,
    word: &str,
    ordinal: usize,
    terminators: &[char],
) -> Option<Sentence> {
    let pos = nth_position(text, word, ordinal)?;
    sentence_at(text, pos, terminators)
}

/// Sentence enclosing byte offset `pos`; `None` if `pos` is not a char boundary of `text`.
pub fn sentence_at(text: &str, pos: usize, terminators: &[char]) -> Option<Sentence> {
    if !text.is_char_boundary(pos) {
        return None;
    }
    let start = text[..pos]
        .char_indices()
        .rev()
        .find(|(_, ch)| terminators.contains(ch))
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0);
    let end = text[pos..]
        .char_indices()
        .find(|(_, ch)| terminators.contains(ch))
        .map(|(idx, ch)| pos + idx + ch.len_utf8())
        .unwrap_or(text.len());
    Some(Sentence {
        text: text[start..end].trim().to_string(),
        start,
        end,
    })
}

/// Splice `new_sentence` into `start..end`. Spans that do not fit the text leave it unchanged.
pub fn replace_sentence(text: &str, start: usize, end: usize, new_sentence: &str) -> String {
    replace_span(text, start..end, new_sentence)
}

pub fn replace_span(text: &str, span: Range<usize>, replacement: &str) -> String {
    if span.start > span.end || text.get(span.clone()).is_none() {
        return text.to_string();
    }
    splice(text, span, replacement)
}

fn splice(text: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() - range.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}

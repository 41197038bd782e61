//! Overlap-safe multi-word highlighting with per-occurrence identity.
//!
//! All targets are matched in a single leftmost-first pass with the longest
//! strings tried first, so a target that contains a shorter target consumes
//! those characters and is never split or double wrapped.

use std::collections::HashMap;

use aho_corasick::{AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};

/// One highlighted appearance of a target word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaggedOccurrence {
    pub word: String,
    /// Index among this word's matches in left-to-right order, starting at 0.
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Segment {
    Plain { text: String, start: usize },
    Occurrence(TaggedOccurrence),
}

impl Segment {
    /// Source text covered by this segment.
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain { text, .. } => text,
            Segment::Occurrence(occ) => &occ.word,
        }
    }

    pub fn start(&self) -> usize {
        match self {
            Segment::Plain { start, .. } => *start,
            Segment::Occurrence(occ) => occ.start,
        }
    }
}

/// Text split into plain and highlighted segments covering every input byte once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatedText {
    pub segments: Vec<Segment>,
}

impl AnnotatedText {
    /// Concatenation of all segments; always equals the annotated input.
    pub fn source_text(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }

    pub fn occurrences(&self) -> impl Iterator<Item = &TaggedOccurrence> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Occurrence(occ) => Some(occ),
            Segment::Plain { .. } => None,
        })
    }

    pub fn occurrences_of<'a>(
        &'a self,
        word: &'a str,
    ) -> impl Iterator<Item = &'a TaggedOccurrence> + 'a {
        self.occurrences().filter(move |occ| occ.word == word)
    }

    /// The result borrows only `self`, so `word` may be a temporary.
    pub fn locate(&self, word: &str, ordinal: usize) -> Option<&TaggedOccurrence> {
        self.occurrences()
            .find(|occ| occ.word == word && occ.ordinal == ordinal)
    }

    fn push_plain(&mut self, text: &str, start: usize) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Plain { text: prev, .. }) = self.segments.last_mut() {
            prev.push_str(text);
            return;
        }
        self.segments.push(Segment::Plain {
            text: text.to_string(),
            start,
        });
    }
}

/// Targets sorted longest first; equal lengths keep their given order.
fn ordered_patterns(targets: &[String]) -> Vec<&str> {
    let mut patterns: Vec<&str> = Vec::new();
    for target in targets {
        if !target.is_empty() && !patterns.contains(&target.as_str()) {
            patterns.push(target);
        }
    }
    patterns.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    patterns
}

pub fn annotate(text: &str, targets: &[String]) -> AnnotatedText {
    let mut annotated = AnnotatedText::default();
    let patterns = ordered_patterns(targets);
    if patterns.is_empty() {
        annotated.push_plain(text, 0);
        return annotated;
    }

    let matcher = AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostFirst)
        .build(&patterns);

    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut cursor = 0;
    for mat in matcher.find_iter(text) {
        annotated.push_plain(&text[cursor..mat.start()], cursor);
        let word = patterns[mat.pattern()];
        let counter = counters.entry(word).or_insert(0);
        annotated.segments.push(Segment::Occurrence(TaggedOccurrence {
            word: word.to_string(),
            ordinal: *counter,
            start: mat.start(),
            end: mat.end(),
        }));
        *counter += 1;
        cursor = mat.end();
    }
    annotated.push_plain(&text[cursor..], cursor);
    annotated
}

/// Highlight only `word`, scanning with the full target set so ordinals match [`annotate`].
pub fn annotate_only(text: &str, targets: &[String], word: &str) -> AnnotatedText {
    let full = annotate(text, targets);
    let mut filtered = AnnotatedText::default();
    for segment in full.segments {
        match segment {
            Segment::Occurrence(occ) if occ.word == word => {
                filtered.segments.push(Segment::Occurrence(occ));
            }
            other => filtered.push_plain(other.text(), other.start()),
        }
    }
    filtered
}

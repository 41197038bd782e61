//! Explicit editing state: current text, selected occurrence and filter word.
//!
//! Every method takes the session by value or reference and hands back the new
//! state. Views are recomputed from the current text on every call.

use serde::{Deserialize, Serialize};

use crate::{
    edit::{self, Sentence},
    frequency::FrequencyReport,
    highlight::AnnotatedText,
    suggest::SuggestionBook,
    Analyzer,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub word: String,
    pub ordinal: usize,
}

/// Edit command addressed at the current text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Edit {
    Occurrence {
        word: String,
        ordinal: usize,
        replacement: String,
    },
    Sentence {
        word: String,
        ordinal: usize,
        sentence: String,
    },
    All {
        word: String,
        replacement: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionView {
    pub report: FrequencyReport,
    pub annotated: AnnotatedText,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    text: String,
    selection: Option<Selection>,
    filter: Option<String>,
}

impl Session {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selection: None,
            filter: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Replace the text wholesale. Any selection refers to the old text and is dropped.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selection: None,
            filter: self.filter,
        }
    }

    pub fn select(self, word: impl Into<String>, ordinal: usize) -> Self {
        Self {
            selection: Some(Selection {
                word: word.into(),
                ordinal,
            }),
            ..self
        }
    }

    pub fn clear_selection(self) -> Self {
        Self {
            selection: None,
            ..self
        }
    }

    pub fn with_filter(self, filter: Option<String>) -> Self {
        Self { filter, ..self }
    }

    pub fn view(&self, analyzer: &Analyzer, book: &SuggestionBook) -> SessionView {
        let report = analyzer.analyze(&self.text, &book.headwords());
        let annotated = match &self.filter {
            Some(word) => analyzer.annotate_only(&self.text, &report.targets, word),
            None => analyzer.annotate(&self.text, &report.targets),
        };
        SessionView { report, annotated }
    }

    /// Byte offset of occurrence `ordinal` of `word`, numbered the way [`Session::view`]
    /// numbers it. Highlighted words resolve through the annotation, so an
    /// occurrence nested inside a longer target is never addressed. Other words
    /// fall back to literal occurrence order.
    pub fn occurrence_start(
        &self,
        analyzer: &Analyzer,
        book: &SuggestionBook,
        word: &str,
        ordinal: usize,
    ) -> Option<usize> {
        let report = analyzer.analyze(&self.text, &book.headwords());
        if report.is_target(word) {
            let annotated = analyzer.annotate(&self.text, &report.targets);
            annotated.locate(word, ordinal).map(|occ| occ.start)
        } else {
            edit::occurrence_positions(&self.text, word)
                .get(ordinal)
                .copied()
        }
    }

    pub fn selected_sentence(
        &self,
        analyzer: &Analyzer,
        book: &SuggestionBook,
    ) -> Option<Sentence> {
        let selection = self.selection.as_ref()?;
        let pos = self.occurrence_start(analyzer, book, &selection.word, selection.ordinal)?;
        analyzer.sentence_at(&self.text, pos)
    }

    /// Apply `edit` to the current text. Stale addresses leave the text as it was.
    pub fn apply(self, analyzer: &Analyzer, book: &SuggestionBook, edit: &Edit) -> Self {
        let text = match edit {
            Edit::Occurrence {
                word,
                ordinal,
                replacement,
            } => match self.occurrence_start(analyzer, book, word, *ordinal) {
                Some(pos) if !word.is_empty() => {
                    edit::replace_span(&self.text, pos..pos + word.len(), replacement)
                }
                _ => self.text.clone(),
            },
            Edit::Sentence {
                word,
                ordinal,
                sentence,
            } => match self
                .occurrence_start(analyzer, book, word, *ordinal)
                .and_then(|pos| analyzer.sentence_at(&self.text, pos))
            {
                Some(found) => {
                    let span = found.trimmed_span(&self.text);
                    edit::replace_span(&self.text, span, sentence)
                }
                None => self.text.clone(),
            },
            Edit::All { word, replacement } => {
                analyzer.replace_all(&self.text, word, replacement)
            }
        };
        if text == self.text {
            return self;
        }
        self.with_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, SuggestionRecord};

    const DOC: &str = "치료는 치료다. 이 치료는 길다.";

    fn analyzer() -> Analyzer {
        Analyzer::new(Config::default()).unwrap()
    }

    #[test]
    fn view_recomputes_from_current_text() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(DOC);
        let before = session.view(&a, &book);
        assert_eq!(before.report.count("치료"), 3);
        assert_eq!(before.annotated.occurrences().count(), 3);

        let session = session.apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: "치료".into(),
                ordinal: 0,
                replacement: "관리".into(),
            },
        );
        let after = session.view(&a, &book);
        assert_eq!(after.report.count("치료"), 2);
        assert_eq!(
            after
                .annotated
                .occurrences_of("치료")
                .map(|o| o.ordinal)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn known_headwords_drive_targets() {
        let a = analyzer();
        let book = SuggestionBook::from_records(&[SuggestionRecord::new("길다", "짧지 않다")]);
        let view = Session::new(DOC).view(&a, &book);
        assert!(view.report.is_target("길다"));
        assert!(view.annotated.locate("길다", 0).is_some());
    }

    #[test]
    fn filter_limits_highlighting() {
        let a = analyzer();
        let book = SuggestionBook::from_records(&[SuggestionRecord::new("길다", "x")]);
        let view = Session::new(DOC)
            .with_filter(Some("길다".into()))
            .view(&a, &book);
        assert!(view.annotated.occurrences().all(|o| o.word == "길다"));
        assert_eq!(view.annotated.source_text(), DOC);
    }

    #[test]
    fn edit_clears_selection_but_keeps_filter() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(DOC)
            .with_filter(Some("치료".into()))
            .select("치료", 2);
        assert_eq!(
            session.selected_sentence(&a, &book).map(|s| s.text),
            Some("이 치료는 길다.".to_string())
        );
        let session = session.apply(
            &a,
            &book,
            &Edit::Sentence {
                word: "치료".into(),
                ordinal: 2,
                sentence: "짧은 문장.".into(),
            },
        );
        assert_eq!(session.text(), "치료는 치료다. 짧은 문장.");
        assert!(session.selection().is_none());
        assert_eq!(session.filter(), Some("치료"));
    }

    #[test]
    fn stale_edit_keeps_state() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(DOC).select("치료", 9);
        let after = session.clone().apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: "치료".into(),
                ordinal: 9,
                replacement: "관리".into(),
            },
        );
        assert_eq!(after, session);
    }

    #[test]
    fn replace_all_edit() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(DOC).apply(
            &a,
            &book,
            &Edit::All {
                word: "치료".into(),
                replacement: "관리".into(),
            },
        );
        assert_eq!(session.text(), "관리는 관리다. 이 관리는 길다.");
    }

    const NESTED: &str = "김해adhd 병원. adhd 검사. adhd 상담. 김해adhd 치료.";

    #[test]
    fn occurrence_edit_follows_highlight_ordinals() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(NESTED);
        let view = session.view(&a, &book);
        let first = view.annotated.locate("adhd", 0).cloned().unwrap();
        assert_eq!(&NESTED[first.start..first.end], "adhd");

        let session = session.apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: first.word,
                ordinal: first.ordinal,
                replacement: "ADHD".into(),
            },
        );
        assert_eq!(
            session.text(),
            "김해adhd 병원. ADHD 검사. adhd 상담. 김해adhd 치료."
        );
    }

    #[test]
    fn sentence_edit_follows_highlight_ordinals() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(NESTED).select("adhd", 1);
        assert_eq!(
            session.selected_sentence(&a, &book).map(|s| s.text),
            Some("adhd 상담.".to_string())
        );
        let session = session.apply(
            &a,
            &book,
            &Edit::Sentence {
                word: "adhd".into(),
                ordinal: 1,
                sentence: "새 문장.".into(),
            },
        );
        assert_eq!(
            session.text(),
            "김해adhd 병원. adhd 검사. 새 문장. 김해adhd 치료."
        );
    }

    #[test]
    fn shadowed_occurrences_are_not_addressable() {
        let a = analyzer();
        let book = SuggestionBook::default();
        // Four literal "adhd" substrings, only two highlighted.
        let session = Session::new(NESTED);
        let after = session.clone().apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: "adhd".into(),
                ordinal: 2,
                replacement: "ADHD".into(),
            },
        );
        assert_eq!(after, session);
    }

    #[test]
    fn words_below_threshold_use_literal_order() {
        let a = analyzer();
        let book = SuggestionBook::default();
        let session = Session::new(NESTED).apply(
            &a,
            &book,
            &Edit::Occurrence {
                word: "병원".into(),
                ordinal: 0,
                replacement: "의원".into(),
            },
        );
        assert_eq!(
            session.text(),
            "김해adhd 의원. adhd 검사. adhd 상담. 김해adhd 치료."
        );
    }
}

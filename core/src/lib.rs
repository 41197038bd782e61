//! Repeated Word Guard core engine.
//! Finds headwords that repeat often enough to deserve an editor's attention,
//! highlights every occurrence with a stable `(word, ordinal)` identity, and
//! rewrites exactly the occurrence or sentence the operator picked.

use std::{collections::HashSet, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod edit;
pub mod frequency;
pub mod highlight;
pub mod normalize;
pub mod session;
pub mod suggest;

pub use edit::{Sentence, DEFAULT_TERMINATORS};
pub use frequency::{
    FrequencyReport, OccurrenceScanner, ScanMode, SubstringScanner, TokenBoundaryScanner,
};
pub use highlight::{AnnotatedText, Segment, TaggedOccurrence};
pub use normalize::{Normalizer, MIN_HEADWORD_CHARS};
pub use session::{Edit, Selection, Session, SessionView};
pub use suggest::{
    JsonLinesStore, MemoryStore, Resolution, StoreError, SuggestionBook, SuggestionRecord,
    SuggestionStore,
};

/// Sentence boundary settings for sentence-level edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceConfig {
    /// Every character in this string ends a sentence.
    pub terminators: String,
}

impl Default for SentenceConfig {
    fn default() -> Self {
        Self {
            terminators: DEFAULT_TERMINATORS.into(),
        }
    }
}

/// Where replacement suggestions are read from and appended to.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SuggestionConfig {
    pub path: Option<PathBuf>,
}

/// Document discovery rules for directory scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRules {
    pub ignore_globs: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            ignore_globs: vec![
                "target/**".into(),
                "**/.git/**".into(),
                "node_modules/**".into(),
                "**/node_modules/**".into(),
            ],
        }
    }
}

/// Top-level configuration for the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum occurrence count for a headword to be highlighted.
    pub threshold: usize,
    pub scan: ScanMode,
    pub stopwords: Vec<String>,
    /// Trailing particles and endings stripped once from each token.
    pub suffixes: Vec<String>,
    pub sentence: SentenceConfig,
    pub suggestions: SuggestionConfig,
    pub files: FileRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 2,
            scan: ScanMode::Substring,
            stopwords: [
                "있다", "있습니다", "있어요", "있는", "하는", "합니다", "하고", "됩니다",
                "것입니다", "매우", "정말", "사실", "그래서", "그러나", "그런데", "그리고",
                "수", "것", "등", "더", "그", "이", "가", "을", "를", "은", "는", "의",
                "위한", "통해", "대해", "관한",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            suffixes: [
                "은", "는", "이", "가", "을", "를", "의", "에", "로", "으로", "에게", "께",
                "에서", "와", "과", "한", "하다", "해요", "된", "지",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            sentence: SentenceConfig::default(),
            suggestions: SuggestionConfig::default(),
            files: FileRules::default(),
        }
    }
}

/// Analyzer holds the compiled configuration and exposes every engine operation.
pub struct Analyzer {
    config: Config,
    normalizer: Normalizer,
    scanner: Box<dyn OccurrenceScanner + Send + Sync>,
    terminators: Vec<char>,
}

impl Analyzer {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        if config.threshold == 0 {
            anyhow::bail!("threshold must be at least 1");
        }
        let normalizer = Normalizer::new(&config.stopwords, &config.suffixes)?;
        let scanner = config.scan.scanner();
        let terminators = config.sentence.terminators.chars().collect();
        Ok(Self {
            config,
            normalizer,
            scanner,
            terminators,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn normalize(&self, token: &str) -> Option<String> {
        self.normalizer.normalize(token)
    }

    /// Count headwords of `text` and select targets by threshold or store membership.
    pub fn analyze(&self, text: &str, known: &HashSet<String>) -> FrequencyReport {
        let report = frequency::analyze_frequency(
            &self.normalizer,
            self.scanner.as_ref(),
            text,
            known,
            self.config.threshold,
        );
        debug!(
            tokens = report.total_tokens,
            headwords = report.counts.len(),
            targets = report.targets.len(),
            "analyzed text"
        );
        report
    }

    pub fn annotate(&self, text: &str, targets: &[String]) -> AnnotatedText {
        highlight::annotate(text, targets)
    }

    pub fn annotate_only(&self, text: &str, targets: &[String], word: &str) -> AnnotatedText {
        highlight::annotate_only(text, targets, word)
    }

    pub fn replace_occurrence(
        &self,
        text: &str,
        word: &str,
        ordinal: usize,
        replacement: &str,
    ) -> String {
        edit::replace_occurrence(text, word, ordinal, replacement)
    }

    pub fn extract_sentence(&self, text: &str, word: &str, ordinal: usize) -> Option<Sentence> {
        edit::extract_sentence(text, word, ordinal, &self.terminators)
    }

    pub fn sentence_at(&self, text: &str, pos: usize) -> Option<Sentence> {
        edit::sentence_at(text, pos, &self.terminators)
    }

    pub fn replace_sentence(
        &self,
        text: &str,
        start: usize,
        end: usize,
        new_sentence: &str,
    ) -> String {
        edit::replace_sentence(text, start, end, new_sentence)
    }

    pub fn replace_all(&self, text: &str, word: &str, replacement: &str) -> String {
        edit::replace_all(text, word, replacement)
    }
}

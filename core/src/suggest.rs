//! Replacement-suggestion store boundary.
//!
//! The store is an append-only list of `(target_word, replace_word)` records.
//! [`SuggestionBook`] coalesces those records into one ordered suggestion list
//! per headword; any read failure degrades to an empty book.

use std::{
    collections::{BTreeMap, HashSet},
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::normalize::Normalizer;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("suggestion store I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed suggestion record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode suggestion record: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionRecord {
    pub target_word: String,
    /// One or more replacements, comma separated.
    pub replace_word: String,
}

impl SuggestionRecord {
    pub fn new(target_word: impl Into<String>, replace_word: impl Into<String>) -> Self {
        Self {
            target_word: target_word.into(),
            replace_word: replace_word.into(),
        }
    }
}

pub trait SuggestionStore {
    fn records(&self) -> Result<Vec<SuggestionRecord>, StoreError>;
    fn append(&mut self, record: SuggestionRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<SuggestionRecord>,
}

impl MemoryStore {
    pub fn new(records: Vec<SuggestionRecord>) -> Self {
        Self { records }
    }
}

impl SuggestionStore for MemoryStore {
    fn records(&self) -> Result<Vec<SuggestionRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, record: SuggestionRecord) -> Result<(), StoreError> {
        self.records.push(record);
        Ok(())
    }
}

/// File-backed store holding one JSON record per line.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SuggestionStore for JsonLinesStore {
    fn records(&self) -> Result<Vec<SuggestionRecord>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: SuggestionRecord =
                serde_json::from_str(line).map_err(|source| StoreError::Malformed {
                    line: idx + 1,
                    source,
                })?;
            records.push(record);
        }
        Ok(records)
    }

    fn append(&mut self, record: SuggestionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let line = serde_json::to_string(&record).map_err(StoreError::Encode)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{line}").map_err(|e| self.io_error(e))
    }
}

/// Result of resolving a clicked surface word against the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Store key that matched, if any.
    pub key: Option<&'a str>,
    pub suggestions: &'a [String],
}

/// Coalesced view of the store: headword to ordered replacement list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionBook {
    entries: BTreeMap<String, Vec<String>>,
}

impl SuggestionBook {
    pub fn from_records(records: &[SuggestionRecord]) -> Self {
        let mut joined: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for record in records {
            let key = record.target_word.trim();
            if key.is_empty() {
                continue;
            }
            joined
                .entry(key.to_string())
                .or_default()
                .push(record.replace_word.as_str());
        }
        let entries = joined
            .into_iter()
            .map(|(key, parts)| (key, split_replacements(&parts.join(","))))
            .collect();
        Self { entries }
    }

    /// Snapshot the store. Read failures are logged and yield an empty book.
    pub fn load(store: &dyn SuggestionStore) -> Self {
        match store.records() {
            Ok(records) => {
                let book = Self::from_records(&records);
                debug!(
                    records = records.len(),
                    headwords = book.len(),
                    "loaded suggestion store"
                );
                book
            }
            Err(err) => {
                warn!(error = %err, "suggestion store unavailable; continuing without suggestions");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn headwords(&self) -> HashSet<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn lookup(&self, headword: &str) -> &[String] {
        self.entries
            .get(headword)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Exact surface form first, then its headword.
    pub fn resolve(&self, normalizer: &Normalizer, surface: &str) -> Resolution<'_> {
        let exact = self.entries.get_key_value(surface);
        let found = exact.or_else(|| {
            normalizer
                .normalize(surface)
                .and_then(|head| self.entries.get_key_value(head.as_str()))
        });
        match found {
            Some((key, list)) => Resolution {
                key: Some(key.as_str()),
                suggestions: list.as_slice(),
            },
            None => Resolution {
                key: None,
                suggestions: &[],
            },
        }
    }
}

/// Store key used when proposing replacements for a surface word.
pub fn proposal_key(normalizer: &Normalizer, surface: &str) -> String {
    normalizer
        .normalize(surface)
        .unwrap_or_else(|| surface.trim().to_string())
}

/// Append a proposal for `surface`, returning the key it was stored under.
pub fn propose(
    store: &mut dyn SuggestionStore,
    normalizer: &Normalizer,
    surface: &str,
    replacements: &str,
) -> Result<String, StoreError> {
    let key = proposal_key(normalizer, surface);
    store.append(SuggestionRecord::new(key.clone(), replacements.trim()))?;
    debug!(key = %key, "appended suggestion record");
    Ok(key)
}

fn split_replacements(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

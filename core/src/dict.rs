//! Custom-word and stop-word dictionaries shared between the tokenization
//! path and the background synchronization tasks.
//!
//! The store layers a mutable overlay (remote upserts, runtime additions)
//! over an immutable base lexicon built from the local dictionary file. The
//! base uses an FST for key lookup and a bincode-serializable payload vector,
//! so it can be cached on disk and swapped wholesale on reload. Readers take
//! shared locks only; the single writer is the sync subsystem, whose lock
//! hold times are bounded by its own network timeouts.

use crate::error::{AnalysisError, Result};
use crate::term::{Nature, Term};
use crate::utils;
use ahash::{AHashMap, AHashSet};
use fst::{Map, MapBuilder};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default frequency for dictionary lines that carry no explicit one.
pub const DEFAULT_FREQUENCY: u32 = 1000;

/// A single custom-dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictEntry {
    pub word: String,
    pub nature: Nature,
    pub frequency: u32,
}

impl DictEntry {
    pub fn new<S: Into<String>>(word: S, nature: Nature, frequency: u32) -> Self {
        Self {
            word: word.into(),
            nature,
            frequency,
        }
    }

    /// Parse a dictionary line: `word [tag frequency]*`.
    ///
    /// Blank lines parse to `None`. Lines without tag/frequency pairs take
    /// `default_nature` and [`DEFAULT_FREQUENCY`]. When several pairs are
    /// present the first is kept as the primary classification. A malformed
    /// pair is a [`AnalysisError::Parse`], which callers skip per line.
    pub fn parse_line(line: &str, default_nature: Nature) -> Result<Option<DictEntry>> {
        let mut parts = line.split_whitespace();
        let word = match parts.next() {
            Some(w) => w,
            None => return Ok(None),
        };
        let (nature, frequency) = match parts.next() {
            None => (default_nature, DEFAULT_FREQUENCY),
            Some(tag) => {
                let nature = Nature::parse(tag).unwrap_or(Nature::X);
                let frequency = match parts.next() {
                    Some(raw) => raw.parse::<u32>().map_err(|_| AnalysisError::Parse {
                        line: line.to_string(),
                        reason: format!("invalid frequency {raw:?}"),
                    })?,
                    None => {
                        return Err(AnalysisError::Parse {
                            line: line.to_string(),
                            reason: format!("tag {tag:?} without frequency"),
                        })
                    }
                };
                (nature, frequency)
            }
        };
        Ok(Some(DictEntry::new(word, nature, frequency)))
    }
}

/// Serializable form of [`StaticLexicon`], the on-disk cache payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct LexiconArtifact {
    pub fst_bytes: Vec<u8>,
    pub payloads: Vec<DictEntry>,
}

/// Immutable word lexicon: FST map from word to payload index.
#[derive(Debug)]
pub struct StaticLexicon {
    fst: Map<Vec<u8>>,
    payloads: Vec<DictEntry>,
    max_word_chars: usize,
}

impl StaticLexicon {
    /// Build from parsed entries. Duplicate words keep the last entry.
    pub fn build(mut entries: Vec<DictEntry>) -> Result<Self> {
        entries.sort_by(|a, b| a.word.cmp(&b.word));
        // Last write wins within a load, matching the store's upsert rule.
        entries.dedup_by(|next, prev| {
            if next.word == prev.word {
                *prev = next.clone();
                true
            } else {
                false
            }
        });
        let mut builder = MapBuilder::memory();
        for (idx, entry) in entries.iter().enumerate() {
            builder.insert(entry.word.as_bytes(), idx as u64)?;
        }
        let fst_bytes = builder.into_inner()?;
        Self::from_parts(fst_bytes, entries)
    }

    pub fn from_artifact(artifact: LexiconArtifact) -> Result<Self> {
        Self::from_parts(artifact.fst_bytes, artifact.payloads)
    }

    pub fn to_artifact(&self) -> LexiconArtifact {
        LexiconArtifact {
            fst_bytes: self.fst.as_fst().as_bytes().to_vec(),
            payloads: self.payloads.clone(),
        }
    }

    fn from_parts(fst_bytes: Vec<u8>, payloads: Vec<DictEntry>) -> Result<Self> {
        let fst = Map::new(fst_bytes)?;
        let max_word_chars = payloads
            .iter()
            .map(|e| e.word.chars().count())
            .max()
            .unwrap_or(0);
        Ok(Self {
            fst,
            payloads,
            max_word_chars,
        })
    }

    pub fn get(&self, word: &str) -> Option<&DictEntry> {
        self.fst
            .get(word.as_bytes())
            .and_then(|idx| self.payloads.get(idx as usize))
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Thread-safe dictionary store.
///
/// Reads (`lookup`, `is_stop_word`, `should_remove`, prefix probing) take
/// shared locks and run concurrently with tokenization; writes take the
/// corresponding exclusive lock briefly per mutation, so readers never
/// observe a partially written entry. For a given word the last committed
/// write wins.
#[derive(Debug, Default)]
pub struct DictionaryStore {
    base: RwLock<Option<StaticLexicon>>,
    overlay: RwLock<AHashMap<String, DictEntry>>,
    stop_words: RwLock<AHashSet<String>>,
    /// Longest word across base and overlay, bounding the matcher's window.
    max_word_chars: AtomicUsize,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a word, preferring overlay entries over the base lexicon.
    pub fn lookup(&self, word: &str) -> Option<DictEntry> {
        if let Some(entry) = self.overlay.read().get(word) {
            return Some(entry.clone());
        }
        self.base.read().as_ref()?.get(word).cloned()
    }

    pub fn contains(&self, word: &str) -> bool {
        if self.overlay.read().contains_key(word) {
            return true;
        }
        self.base
            .read()
            .as_ref()
            .is_some_and(|lex| lex.get(word).is_some())
    }

    /// Insert or atomically replace a custom word.
    pub fn upsert(&self, word: &str, nature: Nature, frequency: u32) {
        let word = utils::normalize_word(word);
        if word.is_empty() {
            return;
        }
        let chars = word.chars().count();
        self.max_word_chars.fetch_max(chars, Ordering::Relaxed);
        let entry = DictEntry::new(word.clone(), nature, frequency);
        self.overlay.write().insert(word, entry);
    }

    /// Replace the base lexicon wholesale (local dictionary reload).
    pub fn replace_base(&self, lexicon: StaticLexicon) {
        self.max_word_chars
            .fetch_max(lexicon.max_word_chars, Ordering::Relaxed);
        *self.base.write() = Some(lexicon);
    }

    pub fn add_stop_word(&self, word: &str) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        self.stop_words.write().insert(word.to_string());
    }

    pub fn remove_stop_word(&self, word: &str) {
        self.stop_words.write().remove(word.trim());
    }

    /// Replace the stop-word set wholesale (local stop dictionary reload).
    pub fn replace_stop_words<I: IntoIterator<Item = String>>(&self, words: I) {
        let set: AHashSet<String> = words.into_iter().collect();
        *self.stop_words.write() = set;
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.read().contains(word)
    }

    /// Stop-filter predicate: punctuation-class natures are always removed,
    /// everything else is removed only on stop-set membership.
    pub fn should_remove(&self, term: &Term) -> bool {
        if term.nature.is_some_and(|n| n.is_punctuation()) {
            return true;
        }
        self.is_stop_word(&term.word)
    }

    /// Longest dictionary word matching a prefix of `chars`, as
    /// (char length, entry). Used by the maximum-matching segmenter.
    pub fn longest_prefix(&self, chars: &[char]) -> Option<(usize, DictEntry)> {
        let window = self.max_word_chars.load(Ordering::Relaxed).min(chars.len());
        let mut candidate: String = chars[..window].iter().collect();
        for len in (1..=window).rev() {
            if let Some(entry) = self.lookup(&candidate) {
                return Some((len, entry));
            }
            if len > 1 {
                candidate.truncate(
                    candidate
                        .char_indices()
                        .nth(len - 1)
                        .map(|(i, _)| i)
                        .unwrap_or(0),
                );
            }
        }
        None
    }

    /// Number of custom words visible to readers.
    pub fn word_count(&self) -> usize {
        let base = self.base.read().as_ref().map_or(0, StaticLexicon::len);
        base + self.overlay.read().len()
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.read().len()
    }
}

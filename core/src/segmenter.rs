//! The segmentation seam and a dictionary-driven reference implementation.
//!
//! Real segmentation engines (CRF, perceptron, shortest-path) plug in behind
//! the [`Segmenter`] trait; the engine only requires "segment a character
//! slice into ordered terms with offsets and optional tags". The bundled
//! [`DictSegmenter`] is a forward-maximum-matching segmenter over the shared
//! [`DictionaryStore`], enough to drive the full pipeline and its tests.

use crate::dict::DictionaryStore;
use crate::term::{Nature, Term};
use crate::Config;
use std::sync::Arc;

/// Switches forwarded to a segmentation engine. Built once per analyzer from
/// the recognized options plus the variant's forced overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub index_mode: bool,
    pub custom_dictionary: bool,
    pub name_recognize: bool,
    pub translated_name_recognize: bool,
    pub japanese_name_recognize: bool,
    pub place_recognize: bool,
    pub organization_recognize: bool,
    pub number_quantifier_recognize: bool,
    pub part_of_speech_tagging: bool,
    pub traditional_chinese: bool,
    pub offset: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            index_mode: false,
            custom_dictionary: true,
            name_recognize: true,
            translated_name_recognize: true,
            japanese_name_recognize: false,
            place_recognize: false,
            organization_recognize: false,
            number_quantifier_recognize: false,
            part_of_speech_tagging: false,
            traditional_chinese: false,
            offset: true,
        }
    }
}

impl SegmenterConfig {
    /// Lift the full switch set out of the analysis config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            index_mode: config.enable_index_mode,
            custom_dictionary: config.enable_custom_dictionary,
            name_recognize: config.enable_name_recognize,
            translated_name_recognize: config.enable_translated_name_recognize,
            japanese_name_recognize: config.enable_japanese_name_recognize,
            place_recognize: config.enable_place_recognize,
            organization_recognize: config.enable_organization_recognize,
            number_quantifier_recognize: config.enable_number_quantifier_recognize,
            part_of_speech_tagging: config.enable_part_of_speech_tagging,
            traditional_chinese: config.enable_traditional_chinese_mode,
            offset: config.enable_offset,
        }
    }
}

/// A segmentation engine: character slice in, ordered terms out.
///
/// Offsets in the returned terms are relative to the slice, in characters.
/// An empty result is a valid answer for a slice with nothing extractable.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<Term>;
}

/// Quantifier characters the reference segmenter may fuse onto a preceding
/// numeral when quantifier recognition is on.
const QUANTIFIERS: [char; 10] = ['个', '只', '件', '条', '名', '位', '次', '年', '月', '日'];

/// Forward-maximum-matching segmenter over the dictionary store.
///
/// Longest dictionary word wins at each position; unmatched CJK characters
/// come out one by one, Latin and digit runs are grouped, punctuation is
/// tagged `w`, and whitespace runs are emitted as blank terms for the
/// pipeline to skip. In index mode, dictionary sub-words of a match are
/// emitted after it so finer grains land in the index too.
pub struct DictSegmenter {
    dict: Arc<DictionaryStore>,
    config: SegmenterConfig,
}

impl DictSegmenter {
    pub fn new(dict: Arc<DictionaryStore>, config: SegmenterConfig) -> Self {
        Self { dict, config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    fn emit_dictionary_match(
        &self,
        chars: &[char],
        start: usize,
        len: usize,
        nature: Nature,
        out: &mut Vec<Term>,
    ) {
        let word: String = chars[start..start + len].iter().collect();
        out.push(Term::new(word, Some(nature), start));
        if !self.config.index_mode || len < 3 {
            return;
        }
        // Finer grains inside the match, longest-first per sub-position.
        let mut sub = start + 1;
        let end = start + len;
        while sub < end {
            let window = &chars[sub..end];
            match self.dict.longest_prefix(window) {
                Some((sub_len, entry)) if sub_len >= 2 && sub_len < len => {
                    let word: String = chars[sub..sub + sub_len].iter().collect();
                    out.push(Term::new(word, Some(entry.nature), sub));
                    sub += 1;
                }
                _ => sub += 1,
            }
        }
    }
}

impl Segmenter for DictSegmenter {
    fn segment(&self, text: &str) -> Vec<Term> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];

            if ch.is_whitespace() {
                let start = i;
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                let run: String = chars[start..i].iter().collect();
                out.push(Term::new(run, None, start));
                continue;
            }

            if ch.is_ascii_alphabetic() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let run: String = chars[start..i].iter().collect();
                out.push(Term::new(run, Some(Nature::Nx), start));
                continue;
            }

            if ch.is_ascii_digit() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if self.config.number_quantifier_recognize
                    && i < chars.len()
                    && QUANTIFIERS.contains(&chars[i])
                {
                    i += 1;
                    let run: String = chars[start..i].iter().collect();
                    out.push(Term::new(run, Some(Nature::Mq), start));
                } else {
                    let run: String = chars[start..i].iter().collect();
                    out.push(Term::new(run, Some(Nature::M), start));
                }
                continue;
            }

            if self.config.custom_dictionary {
                if let Some((len, entry)) = self.dict.longest_prefix(&chars[i..]) {
                    if len > 1 {
                        self.emit_dictionary_match(&chars, i, len, entry.nature, &mut out);
                        i += len;
                        continue;
                    }
                    // Single-char dictionary words keep their tagged nature.
                    out.push(Term::new(
                        entry.word.clone(),
                        Some(entry.nature),
                        i,
                    ));
                    i += 1;
                    continue;
                }
            }

            if is_punctuation(ch) {
                out.push(Term::new(ch.to_string(), Some(Nature::W), i));
                i += 1;
                continue;
            }

            // Unclaimed character, one term per char.
            out.push(Term::new(ch.to_string(), Some(Nature::X), i));
            i += 1;
        }
        out
    }
}

fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii_punctuation() {
        return true;
    }
    // CJK punctuation, full-width forms, and general punctuation blocks.
    matches!(ch as u32,
        0x3000..=0x303F | 0xFF01..=0xFF0F | 0xFF1A..=0xFF20 | 0xFF3B..=0xFF40
        | 0xFF5B..=0xFF65 | 0x2000..=0x206F)
}

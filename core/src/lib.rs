//! hanseg-core
//!
//! Streaming Chinese word segmentation with live dictionaries.
//!
//! Raw text is pulled through a sentence-bounded buffer, segmented chunk by
//! chunk, reconciled onto a single global offset stream and filtered into a
//! token stream with position increments. The dictionaries that drive
//! segmentation (custom words, stop words) are kept in sync with local files
//! (mtime-validated binary caches) and remote HTTP sources (conditional
//! fetches) by a fixed-rate background scheduler, without ever blocking
//! in-flight tokenization.
//!
//! Public API:
//! - `Config` - analysis flags and dictionary paths
//! - `AnalysisContext` - process-scoped owner of dictionaries and sync tasks
//! - `Analyzer` / `AnalyzerKind` - tokenizer variants with preset overrides
//! - `Tokenizer` - the token filter pipeline
//! - `DictionaryStore` - concurrent-read custom/stop dictionaries
//! - `Segmenter` - the seam for pluggable segmentation engines

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod error;
pub use error::{AnalysisError, Result};

pub mod term;
pub use term::{Nature, Term, Token, NULL_TYPE};

pub mod buffer;
pub use buffer::SentenceBuffer;

pub mod dict;
pub use dict::{DictEntry, DictionaryStore, StaticLexicon};

pub mod cache;

pub mod segmenter;
pub use segmenter::{DictSegmenter, Segmenter, SegmenterConfig};

pub mod stream;
pub use stream::SegmentStream;

pub mod tokenizer;
pub use tokenizer::Tokenizer;

pub mod remote;
pub use remote::{RemoteDictConfig, RemoteDictKind, RemoteDictionaryMonitor, RemoteSource};

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod analyzer;
pub use analyzer::{Analyzer, AnalyzerKind};

pub mod context;
pub use context::AnalysisContext;

/// Analysis configuration.
///
/// An immutable value constructed once from recognized options and passed to
/// every component at construction time. Variant-specific forced overrides
/// (index mode, recognizer switches) are applied when an [`Analyzer`] builds
/// its segmenter configuration, never afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Emit sub-words of dictionary matches in addition to the longest match.
    pub enable_index_mode: bool,
    /// Consult the custom dictionary during segmentation.
    pub enable_custom_dictionary: bool,
    /// Stem foreign-language (`nx`) terms with the Porter stemmer.
    pub enable_porter_stemming: bool,
    /// Suppress stop words and punctuation in the token stream.
    pub enable_stop_dictionary: bool,
    /// Fold full-width characters to half-width and lowercase ASCII before
    /// segmentation.
    pub enable_normalization: bool,
    /// Surface character offsets to the host. Offsets are always computed
    /// internally; disabling this never changes the token stream.
    pub enable_offset: bool,
    /// Run the remote dictionary monitors.
    pub enable_remote_dict: bool,
    /// Apply the full switch set below to the segmenter. When off, the
    /// segmenter runs with its defaults plus offsets, matching the plain
    /// analyzer variants.
    pub enable_custom_config: bool,

    // Recognizer switches forwarded to segmenters that support them.
    pub enable_name_recognize: bool,
    pub enable_translated_name_recognize: bool,
    pub enable_japanese_name_recognize: bool,
    pub enable_place_recognize: bool,
    pub enable_organization_recognize: bool,
    pub enable_number_quantifier_recognize: bool,
    pub enable_part_of_speech_tagging: bool,
    pub enable_traditional_chinese_mode: bool,

    /// Custom dictionary text file, one `word [tag freq]*` entry per line.
    pub custom_dict_path: Option<PathBuf>,
    /// Stop word text file, one word per line.
    pub stop_dict_path: Option<PathBuf>,
    /// TOML file with `remote_ext_dict` / `remote_ext_stopwords` keys.
    pub remote_config_path: Option<PathBuf>,
    /// Directory holding segmentation model files for the `nlp`/`crf`
    /// variants.
    pub model_dir: Option<PathBuf>,

    /// Seconds before the first run of each background sync task.
    pub sync_initial_delay_secs: u64,
    /// Fixed period between runs of each background sync task.
    pub sync_period_secs: u64,
    /// Worker threads shared by all sync tasks.
    pub sync_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_index_mode: false,
            enable_custom_dictionary: true,
            enable_porter_stemming: false,
            enable_stop_dictionary: false,
            enable_normalization: false,
            enable_offset: true,
            enable_remote_dict: true,
            enable_custom_config: false,
            enable_name_recognize: true,
            enable_translated_name_recognize: true,
            enable_japanese_name_recognize: false,
            enable_place_recognize: false,
            enable_organization_recognize: false,
            enable_number_quantifier_recognize: false,
            enable_part_of_speech_tagging: false,
            enable_traditional_chinese_mode: false,
            custom_dict_path: None,
            stop_dict_path: None,
            remote_config_path: None,
            model_dir: None,
            sync_initial_delay_secs: 10,
            sync_period_secs: 60,
            sync_workers: 1,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AnalysisError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize a dictionary word: NFC and trimmed whitespace.
    pub fn normalize_word(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }

    /// Convert full-width characters to ASCII (half-width).
    pub fn to_halfwidth(s: &str) -> String {
        s.chars().map(halfwidth_char).collect()
    }

    /// Convert ASCII characters to their full-width equivalents.
    pub fn to_fullwidth(s: &str) -> String {
        s.chars()
            .map(|ch| match ch {
                ' ' => '\u{3000}',
                // ASCII printable range (0x21-0x7E) -> full-width (0xFF01-0xFF5E)
                '!'..='~' => {
                    let code = ch as u32;
                    char::from_u32(code - 0x21 + 0xFF01).unwrap_or(ch)
                }
                _ => ch,
            })
            .collect()
    }

    /// Text normalization applied before segmentation: full-width to
    /// half-width, then ASCII lowercasing. Character count is preserved, so
    /// offsets into the normalized slice remain valid for the original.
    pub fn normalize_text(s: &str) -> String {
        s.chars()
            .map(|ch| {
                let ch = halfwidth_char(ch);
                if ch.is_ascii_uppercase() {
                    ch.to_ascii_lowercase()
                } else {
                    ch
                }
            })
            .collect()
    }

    fn halfwidth_char(ch: char) -> char {
        match ch {
            // Ideographic space -> ASCII space
            '\u{3000}' => ' ',
            // Full-width range (0xFF01-0xFF5E) -> ASCII (0x21-0x7E)
            '\u{FF01}'..='\u{FF5E}' => {
                let code = ch as u32;
                char::from_u32(code - 0xFF01 + 0x21).unwrap_or(ch)
            }
            _ => ch,
        }
    }

}

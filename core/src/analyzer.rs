//! Analyzer variants and their segmenter presets.
//!
//! Each variant maps to a configuration record for the segmenter, built once
//! from the recognized options plus the variant's forced overrides. Variants
//! backed by statistical models are only offered when their model file is
//! present; a missing model surfaces at registration time, never during
//! tokenization.

use crate::dict::DictionaryStore;
use crate::error::{AnalysisError, Result};
use crate::segmenter::{DictSegmenter, Segmenter, SegmenterConfig};
use crate::term::Token;
use crate::tokenizer::Tokenizer;
use crate::Config;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// The analyzer/tokenizer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyzerKind {
    /// Plain dictionary segmentation.
    Standard,
    /// Standard plus sub-word emission for finer index grains.
    Index,
    /// Perceptron lexical analysis (model-gated).
    Nlp,
    /// CRF lexical analysis (model-gated).
    Crf,
    /// N-shortest-path segmentation.
    NShort,
    /// Shortest-path (Dijkstra) segmentation.
    Dijkstra,
    /// Pure longest-match dictionary segmentation.
    Speed,
}

impl AnalyzerKind {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerKind::Standard => "standard",
            AnalyzerKind::Index => "index",
            AnalyzerKind::Nlp => "nlp",
            AnalyzerKind::Crf => "crf",
            AnalyzerKind::NShort => "n_short",
            AnalyzerKind::Dijkstra => "dijkstra",
            AnalyzerKind::Speed => "speed",
        }
    }

    pub fn parse(name: &str) -> Option<AnalyzerKind> {
        let kind = match name {
            "standard" => AnalyzerKind::Standard,
            "index" => AnalyzerKind::Index,
            "nlp" => AnalyzerKind::Nlp,
            "crf" => AnalyzerKind::Crf,
            "n_short" => AnalyzerKind::NShort,
            "dijkstra" => AnalyzerKind::Dijkstra,
            "speed" => AnalyzerKind::Speed,
            _ => return None,
        };
        Some(kind)
    }

    pub fn all() -> [AnalyzerKind; 7] {
        [
            AnalyzerKind::Standard,
            AnalyzerKind::Index,
            AnalyzerKind::Nlp,
            AnalyzerKind::Crf,
            AnalyzerKind::NShort,
            AnalyzerKind::Dijkstra,
            AnalyzerKind::Speed,
        ]
    }

    /// Relative path of the model file this variant needs, if any.
    fn model_file(&self) -> Option<&'static str> {
        match self {
            AnalyzerKind::Nlp => Some("perceptron/cws.bin"),
            AnalyzerKind::Crf => Some("crf/cws.bin"),
            _ => None,
        }
    }
}

/// Build the segmenter configuration for a variant.
///
/// Without `enable_custom_config` the segmenter runs on its defaults with
/// offsets forced on; otherwise the full switch set is lifted from the
/// config. The variant's forced overrides are applied last, at construction
/// time.
pub fn segmenter_preset(kind: AnalyzerKind, config: &Config) -> SegmenterConfig {
    let mut preset = if config.enable_custom_config {
        SegmenterConfig::from_config(config)
    } else {
        SegmenterConfig {
            offset: true,
            ..SegmenterConfig::default()
        }
    };
    match kind {
        AnalyzerKind::Index => {
            preset.index_mode = true;
        }
        AnalyzerKind::Dijkstra | AnalyzerKind::NShort => {
            preset.custom_dictionary = false;
            preset.place_recognize = true;
            preset.organization_recognize = true;
        }
        _ => {}
    }
    preset
}

/// A configured analyzer: a segmenter plus the filter settings, ready to
/// open tokenizers over input readers.
pub struct Analyzer {
    kind: AnalyzerKind,
    config: Config,
    dict: Arc<DictionaryStore>,
    segmenter: Arc<dyn Segmenter>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Construct the variant, verifying model availability first.
    pub fn new(kind: AnalyzerKind, config: Config, dict: Arc<DictionaryStore>) -> Result<Self> {
        if let Some(model_file) = kind.model_file() {
            let path = config
                .model_dir
                .as_ref()
                .map(|dir| dir.join(model_file))
                .unwrap_or_else(|| PathBuf::from(model_file));
            if !path.exists() {
                return Err(AnalysisError::ModelUnavailable {
                    kind: kind.name().to_string(),
                    path,
                });
            }
        }
        let preset = segmenter_preset(kind, &config);
        let segmenter: Arc<dyn Segmenter> = Arc::new(DictSegmenter::new(dict.clone(), preset));
        Ok(Self {
            kind,
            config,
            dict,
            segmenter,
        })
    }

    pub fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    /// Open a streaming tokenizer over a reader.
    pub fn tokenizer<R: Read>(&self, reader: R) -> Tokenizer<R> {
        Tokenizer::new(
            reader,
            self.segmenter.clone(),
            self.dict.clone(),
            &self.config,
        )
    }

    /// Tokenize a full text. Failures inside the hot path degrade to "no
    /// more tokens for this field" instead of propagating.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokenizer = self.tokenizer(Cursor::new(text.as_bytes().to_vec()));
        let mut tokens = Vec::new();
        loop {
            match tokenizer.next_token() {
                Ok(Some(token)) => tokens.push(token),
                Ok(None) => break,
                Err(e) => {
                    warn!("segmentation failed mid-field, truncating output: {}", e);
                    break;
                }
            }
        }
        tokens
    }
}

/// The variants usable with this configuration: model-gated ones drop out
/// here, at registration time, with a logged warning.
pub fn available_analyzers(config: &Config) -> Vec<AnalyzerKind> {
    AnalyzerKind::all()
        .into_iter()
        .filter(|kind| match kind.model_file() {
            None => true,
            Some(model_file) => {
                let path = config
                    .model_dir
                    .as_ref()
                    .map(|dir| dir.join(model_file))
                    .unwrap_or_else(|| PathBuf::from(model_file));
                if path.exists() {
                    true
                } else {
                    warn!(
                        "cannot find model for [{}] at {}; variant unavailable",
                        kind.name(),
                        path.display()
                    );
                    false
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Nature;

    fn demo_dict() -> Arc<DictionaryStore> {
        let dict = Arc::new(DictionaryStore::new());
        dict.upsert("中国", Nature::Ns, 100);
        dict.upsert("人民", Nature::N, 90);
        dict
    }

    #[test]
    fn kind_name_round_trip() {
        for kind in AnalyzerKind::all() {
            assert_eq!(AnalyzerKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(AnalyzerKind::parse("unknown"), None);
    }

    #[test]
    fn index_preset_forces_index_mode() {
        let config = Config::default();
        assert!(!config.enable_index_mode);
        let preset = segmenter_preset(AnalyzerKind::Index, &config);
        assert!(preset.index_mode);
    }

    #[test]
    fn dijkstra_preset_forces_overrides() {
        let config = Config::default();
        let preset = segmenter_preset(AnalyzerKind::Dijkstra, &config);
        assert!(!preset.custom_dictionary);
        assert!(preset.place_recognize);
        assert!(preset.organization_recognize);
        let n_short = segmenter_preset(AnalyzerKind::NShort, &config);
        assert_eq!(preset, n_short);
    }

    #[test]
    fn custom_config_off_uses_defaults_plus_offset() {
        let config = Config {
            enable_index_mode: true, // ignored without enable_custom_config
            ..Config::default()
        };
        let preset = segmenter_preset(AnalyzerKind::Standard, &config);
        assert!(!preset.index_mode);
        assert!(preset.offset);
    }

    #[test]
    fn custom_config_on_lifts_flags() {
        let config = Config {
            enable_custom_config: true,
            enable_index_mode: true,
            ..Config::default()
        };
        let preset = segmenter_preset(AnalyzerKind::Standard, &config);
        assert!(preset.index_mode);
    }

    #[test]
    fn model_gated_variant_unavailable_without_model() {
        let config = Config::default();
        let err = Analyzer::new(AnalyzerKind::Crf, config, demo_dict()).expect_err("no model");
        assert!(matches!(err, AnalysisError::ModelUnavailable { .. }));
    }

    #[test]
    fn available_analyzers_excludes_model_gated() {
        let config = Config::default();
        let kinds = available_analyzers(&config);
        assert!(kinds.contains(&AnalyzerKind::Standard));
        assert!(!kinds.contains(&AnalyzerKind::Nlp));
        assert!(!kinds.contains(&AnalyzerKind::Crf));
    }

    #[test]
    fn model_gated_variant_available_with_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("crf")).expect("mkdir");
        std::fs::write(dir.path().join("crf/cws.bin"), b"model").expect("write model");
        let config = Config {
            model_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let analyzer = Analyzer::new(AnalyzerKind::Crf, config.clone(), demo_dict());
        assert!(analyzer.is_ok());
        assert!(available_analyzers(&config).contains(&AnalyzerKind::Crf));
    }

    #[test]
    fn analyze_produces_ordered_tokens() {
        let analyzer =
            Analyzer::new(AnalyzerKind::Standard, Config::default(), demo_dict()).expect("build");
        let tokens = analyzer.analyze("中国人民。人民");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["中国", "人民", "。", "人民"]);
        let mut last = 0;
        for token in &tokens {
            assert!(token.start_offset >= last);
            last = token.start_offset;
        }
    }
}

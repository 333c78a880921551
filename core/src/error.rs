//! Error types for the analysis engine.
//!
//! Failures fall into four families with different handling policies:
//! missing local dictionary sources abort initialization, network failures
//! during remote sync are logged and retried on the next tick, malformed
//! dictionary lines skip only the offending line, and an absent model file
//! removes the corresponding analyzer variant at registration time.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for analysis operations.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("dictionary source not found: {}", path.display())]
    MissingDictionary { path: PathBuf },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed dictionary line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    #[error("model for analyzer `{kind}` unavailable at {}", path.display())]
    ModelUnavailable { kind: String, path: PathBuf },

    #[error("lexicon index error: {0}")]
    Index(#[from] fst::Error),

    #[error("cache error: {0}")]
    Cache(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Whether a failed operation may succeed if simply retried later.
    ///
    /// Remote monitors swallow transient errors and rely on the fixed-rate
    /// schedule as their retry mechanism.
    pub fn is_transient(&self) -> bool {
        matches!(self, AnalysisError::Network(_) | AnalysisError::Parse { .. })
    }
}

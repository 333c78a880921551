//! Timestamp-validated binary caches for local dictionary files.
//!
//! A dictionary text source gets a co-located `.bin` cache holding the built
//! lexicon (FST bytes + payloads, bincode-encoded). The cache is valid only
//! while it is newer than its source; a stale cache is deleted before the
//! rebuild so a crash mid-rebuild can never leave mismatched data behind.

use crate::dict::{DictEntry, LexiconArtifact, StaticLexicon};
use crate::error::{AnalysisError, Result};
use crate::term::Nature;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix appended to the source path to form the cache path.
pub const CACHE_EXT: &str = "bin";

/// Cache file co-located with its source: `custom.txt` -> `custom.txt.bin`.
pub fn cache_path_for(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".");
    name.push(CACHE_EXT);
    PathBuf::from(name)
}

/// Validity descriptor for one source/cache pair.
#[derive(Debug, Clone)]
pub struct CacheDescriptor {
    pub source_path: PathBuf,
    pub cache_path: PathBuf,
}

impl CacheDescriptor {
    pub fn for_source(source: &Path) -> Self {
        Self {
            source_path: source.to_path_buf(),
            cache_path: cache_path_for(source),
        }
    }
}

/// Decide whether the cache must be rebuilt from its source.
///
/// True when the cache is absent, or when the source's mtime is at or past
/// the cache's (the stale cache file is deleted before returning). A missing
/// source is a fatal configuration error: the dictionary cannot be loaded at
/// all.
pub fn needs_rebuild(source: &Path, cache: &Path) -> Result<bool> {
    let source_meta = fs::metadata(source).map_err(|_| AnalysisError::MissingDictionary {
        path: source.to_path_buf(),
    })?;
    let cache_meta = match fs::metadata(cache) {
        Ok(meta) => meta,
        Err(_) => return Ok(true),
    };
    let source_modified = source_meta.modified()?;
    let cache_modified = cache_meta.modified()?;
    if source_modified >= cache_modified {
        if let Err(e) = fs::remove_file(cache) {
            warn!("failed to delete stale cache {}: {}", cache.display(), e);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Load the custom-word lexicon for `source`, rebuilding the binary cache
/// when the validator says so.
pub fn load_custom_lexicon(source: &Path, default_nature: Nature) -> Result<StaticLexicon> {
    let descriptor = CacheDescriptor::for_source(source);
    if !needs_rebuild(source, &descriptor.cache_path)? {
        match read_cached_lexicon(&descriptor.cache_path) {
            Ok(lexicon) => {
                debug!(
                    "loaded {} custom words from cache {}",
                    lexicon.len(),
                    descriptor.cache_path.display()
                );
                return Ok(lexicon);
            }
            Err(e) => {
                warn!(
                    "unreadable dictionary cache {}: {}; rebuilding",
                    descriptor.cache_path.display(),
                    e
                );
                let _ = fs::remove_file(&descriptor.cache_path);
            }
        }
    }
    let lexicon = build_custom_lexicon(source, default_nature)?;
    write_cached_lexicon(&descriptor.cache_path, &lexicon);
    info!(
        "rebuilt custom dictionary {} ({} words)",
        source.display(),
        lexicon.len()
    );
    Ok(lexicon)
}

fn build_custom_lexicon(source: &Path, default_nature: Nature) -> Result<StaticLexicon> {
    let text = fs::read_to_string(source).map_err(|_| AnalysisError::MissingDictionary {
        path: source.to_path_buf(),
    })?;
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = if number == 0 {
            line.trim_start_matches('\u{feff}')
        } else {
            line
        };
        match DictEntry::parse_line(line, default_nature) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => warn!(
                "{}:{}: skipping dictionary line: {}",
                source.display(),
                number + 1,
                e
            ),
        }
    }
    StaticLexicon::build(entries)
}

fn read_cached_lexicon(cache: &Path) -> Result<StaticLexicon> {
    let bytes = fs::read(cache)?;
    let artifact: LexiconArtifact = bincode::deserialize(&bytes)?;
    StaticLexicon::from_artifact(artifact)
}

fn write_cached_lexicon(cache: &Path, lexicon: &StaticLexicon) {
    let result = bincode::serialize(&lexicon.to_artifact())
        .map_err(AnalysisError::from)
        .and_then(|bytes| fs::write(cache, bytes).map_err(AnalysisError::from));
    if let Err(e) = result {
        // A missing cache only costs a rebuild on the next load.
        warn!("failed to write dictionary cache {}: {}", cache.display(), e);
    }
}

/// Load the stop-word list for `source`, with the same cache discipline as
/// the custom lexicon.
pub fn load_stop_words(source: &Path) -> Result<Vec<String>> {
    let descriptor = CacheDescriptor::for_source(source);
    if !needs_rebuild(source, &descriptor.cache_path)? {
        match read_cached_stop_words(&descriptor.cache_path) {
            Ok(words) => return Ok(words),
            Err(e) => {
                warn!(
                    "unreadable stop-word cache {}: {}; rebuilding",
                    descriptor.cache_path.display(),
                    e
                );
                let _ = fs::remove_file(&descriptor.cache_path);
            }
        }
    }
    let text = fs::read_to_string(source).map_err(|_| AnalysisError::MissingDictionary {
        path: source.to_path_buf(),
    })?;
    let words: Vec<String> = text
        .lines()
        .enumerate()
        .map(|(number, line)| {
            if number == 0 {
                line.trim_start_matches('\u{feff}')
            } else {
                line
            }
        })
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if let Err(e) = bincode::serialize(&words)
        .map_err(AnalysisError::from)
        .and_then(|bytes| fs::write(&descriptor.cache_path, bytes).map_err(AnalysisError::from))
    {
        warn!(
            "failed to write stop-word cache {}: {}",
            descriptor.cache_path.display(),
            e
        );
    }
    info!("loaded {} stop words from {}", words.len(), source.display());
    Ok(words)
}

fn read_cached_stop_words(cache: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(cache)?;
    Ok(bincode::deserialize(&bytes)?)
}

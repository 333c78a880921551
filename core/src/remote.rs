//! Remote dictionary synchronization.
//!
//! One monitor per configured location performs a conditional HEAD against
//! the stored `Last-Modified`/`ETag` validators, fetches the body only when
//! a validator changed, parses it line by line and applies the entries to
//! the shared [`DictionaryStore`]. Every network or parse failure in a run
//! is logged and swallowed; the fixed-rate schedule is the retry mechanism.

use crate::dict::{DictEntry, DictionaryStore};
use crate::error::{AnalysisError, Result};
use crate::term::Nature;
use crate::utils;
use parking_lot::Mutex;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Which dictionary a remote location feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDictKind {
    Custom,
    Stop,
}

impl RemoteDictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteDictKind::Custom => "custom",
            RemoteDictKind::Stop => "stop",
        }
    }
}

/// Remote dictionary locations, read from a TOML key-value file with
/// `remote_ext_dict` / `remote_ext_stopwords` keys, each a `;`-separated
/// list of locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDictConfig {
    pub custom_locations: Vec<String>,
    pub stop_locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawRemoteConfig {
    remote_ext_dict: Option<String>,
    remote_ext_stopwords: Option<String>,
}

fn split_locations(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(';')
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl RemoteDictConfig {
    /// Load the remote config file. A missing or unreadable file logs and
    /// yields an empty config: remote sync is optional.
    pub fn load(path: &Path) -> Self {
        info!("loading remote dictionary config from {}", path.display());
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("remote dictionary config {} unreadable: {}", path.display(), e);
                return Self::default();
            }
        };
        match Self::from_toml_str(&content) {
            Ok(config) => config,
            Err(e) => {
                error!("cannot parse remote dictionary config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawRemoteConfig =
            toml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))?;
        Ok(Self {
            custom_locations: split_locations(raw.remote_ext_dict),
            stop_locations: split_locations(raw.remote_ext_stopwords),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.custom_locations.is_empty() && self.stop_locations.is_empty()
    }
}

/// A parsed remote location: the URL plus the default part-of-speech tag
/// optionally embedded after a space separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub url: String,
    pub default_nature: Nature,
    pub kind: RemoteDictKind,
}

impl RemoteSource {
    pub fn parse(location: &str, kind: RemoteDictKind) -> Self {
        let location = location.trim();
        match location.split_once(' ') {
            Some((url, tag)) => Self {
                url: url.to_string(),
                default_nature: Nature::parse(tag.trim()).unwrap_or(Nature::N),
                kind,
            },
            None => Self {
                url: location.to_string(),
                default_nature: Nature::N,
                kind,
            },
        }
    }
}

/// Conditional-request validators remembered between runs. A stale value
/// only causes a redundant refetch, never data loss.
#[derive(Debug, Clone, Default)]
pub struct RemoteSourceState {
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

/// Scheduled watcher for one remote dictionary location.
pub struct RemoteDictionaryMonitor {
    source: RemoteSource,
    dict: Arc<DictionaryStore>,
    normalize: bool,
    client: Client,
    state: Mutex<RemoteSourceState>,
}

impl RemoteDictionaryMonitor {
    pub fn new(
        location: &str,
        kind: RemoteDictKind,
        dict: Arc<DictionaryStore>,
        normalize: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            source: RemoteSource::parse(location, kind),
            dict,
            normalize,
            client,
            state: Mutex::new(RemoteSourceState::default()),
        })
    }

    pub fn source(&self) -> &RemoteSource {
        &self.source
    }

    /// One scheduled run. Never panics and never propagates: failures are
    /// logged and the next tick retries.
    pub fn run(&self) {
        if let Err(e) = self.run_once() {
            error!(
                "remote {} dictionary load from [{}] error: {}",
                self.source.kind.as_str(),
                self.source.url,
                e
            );
        }
    }

    fn run_once(&self) -> Result<()> {
        let state = self.state.lock().clone();
        let mut request = self.client.head(&self.source.url);
        if let Some(last_modified) = &state.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified.as_str());
        }
        if let Some(etag) = &state.etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }
        let response = request.send()?;
        match response.status() {
            StatusCode::OK => {
                let last_modified = header_value(&response, LAST_MODIFIED);
                let etag = header_value(&response, ETAG);
                let modified = differs(&last_modified, &state.last_modified)
                    || differs(&etag, &state.etag);
                if !modified {
                    debug!("remote dict {} validators unchanged", self.source.url);
                    return Ok(());
                }
                info!(
                    "loading remote {} dictionary from {}",
                    self.source.kind.as_str(),
                    self.source.url
                );
                self.fetch_and_apply()?;
                *self.state.lock() = RemoteSourceState { last_modified, etag };
                info!(
                    "finished loading remote {} dictionary from {}",
                    self.source.kind.as_str(),
                    self.source.url
                );
            }
            StatusCode::NOT_MODIFIED => {
                info!("remote dict {} is without modification", self.source.url);
            }
            status => {
                info!("remote dict {} returned bad status {}", self.source.url, status);
            }
        }
        Ok(())
    }

    fn fetch_and_apply(&self) -> Result<()> {
        let response = self.client.get(&self.source.url).send()?;
        if response.status() != StatusCode::OK {
            info!(
                "remote dict {} body fetch returned {}",
                self.source.url,
                response.status()
            );
            return Ok(());
        }
        let charset = charset_of(&response);
        let bytes = response.bytes()?;
        if let Some(charset) = charset {
            if !charset.eq_ignore_ascii_case("utf-8") && !charset.eq_ignore_ascii_case("utf8") {
                warn!(
                    "remote dict {} declares charset {}; decoding as UTF-8",
                    self.source.url, charset
                );
            }
        }
        let text = String::from_utf8_lossy(&bytes);
        self.apply_body(&text);
        Ok(())
    }

    fn apply_body(&self, body: &str) {
        for (number, line) in body.lines().enumerate() {
            let line = if number == 0 {
                line.trim_start_matches('\u{feff}')
            } else {
                line
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.source.kind {
                RemoteDictKind::Custom => {
                    match DictEntry::parse_line(line, self.source.default_nature) {
                        Ok(Some(entry)) => {
                            let word = if self.normalize {
                                utils::normalize_text(&entry.word)
                            } else {
                                entry.word
                            };
                            debug!("remote custom word: {}", word);
                            self.dict.upsert(&word, entry.nature, entry.frequency);
                        }
                        Ok(None) => {}
                        Err(e) => warn!("{}: skipping remote line: {}", self.source.url, e),
                    }
                }
                RemoteDictKind::Stop => {
                    debug!("remote stop word: {}", line);
                    self.dict.add_stop_word(line);
                }
            }
        }
    }
}

fn header_value(response: &reqwest::blocking::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn differs(fresh: &Option<String>, stored: &Option<String>) -> bool {
    match (fresh, stored) {
        // No validator on the response: nothing to compare, so no refetch.
        (None, _) => false,
        (Some(_), None) => true,
        (Some(a), Some(b)) => !a.eq_ignore_ascii_case(b),
    }
}

fn charset_of(response: &reqwest::blocking::Response) -> Option<String> {
    let content_type = response.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let charset = content_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("charset="))
        .next()?;
    Some(charset.trim_matches('"').to_string())
}

//! Process-scoped analysis context.
//!
//! The context owns the dictionary store, the sync scheduler and the remote
//! monitor set, and is passed (by `Arc`) to every analyzer built from it.
//! `initialize` provides the one-per-process entry point behind a lazy-init
//! cell that is evaluated exactly once even under concurrent first use;
//! embedders and tests construct contexts directly with `new`.

use crate::analyzer::{Analyzer, AnalyzerKind};
use crate::cache;
use crate::dict::DictionaryStore;
use crate::error::Result;
use crate::remote::{RemoteDictConfig, RemoteDictKind, RemoteDictionaryMonitor};
use crate::scheduler::Scheduler;
use crate::term::Nature;
use crate::Config;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

static GLOBAL: OnceCell<Arc<AnalysisContext>> = OnceCell::new();

/// Default part-of-speech tag for local custom-dictionary lines without one.
const LOCAL_DEFAULT_NATURE: Nature = Nature::N;

/// Owner of the shared dictionaries and their synchronization tasks.
pub struct AnalysisContext {
    config: Config,
    dict: Arc<DictionaryStore>,
    scheduler: Scheduler,
}

impl std::fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisContext").finish_non_exhaustive()
    }
}

impl AnalysisContext {
    /// Process-wide initialization. The first caller builds the context;
    /// concurrent and later callers get the same instance. A fatal
    /// configuration error (missing local dictionary) aborts initialization
    /// and is returned to every caller that raced it.
    pub fn initialize(config: Config) -> Result<Arc<AnalysisContext>> {
        GLOBAL
            .get_or_try_init(|| Self::new(config).map(Arc::new))
            .cloned()
    }

    /// The process-wide context, if `initialize` has succeeded.
    pub fn global() -> Option<Arc<AnalysisContext>> {
        GLOBAL.get().cloned()
    }

    /// Build a context: load local dictionaries through the cache
    /// validator, then start the background sync tasks.
    pub fn new(config: Config) -> Result<AnalysisContext> {
        let dict = Arc::new(DictionaryStore::new());

        // Initial local load is fatal when a configured source is missing.
        if let Some(path) = &config.custom_dict_path {
            let lexicon = cache::load_custom_lexicon(path, LOCAL_DEFAULT_NATURE)?;
            info!("custom dictionary ready ({} words)", lexicon.len());
            dict.replace_base(lexicon);
        }
        if let Some(path) = &config.stop_dict_path {
            let words = cache::load_stop_words(path)?;
            dict.replace_stop_words(words);
        }

        let scheduler = Scheduler::new(config.sync_workers);
        let initial_delay = Duration::from_secs(config.sync_initial_delay_secs);
        let period = Duration::from_secs(config.sync_period_secs);

        // Local reload watcher: revalidates the caches every tick and swaps
        // the rebuilt structures in without touching readers.
        if config.custom_dict_path.is_some() || config.stop_dict_path.is_some() {
            let dict_ref = Arc::clone(&dict);
            let custom_path = config.custom_dict_path.clone();
            let stop_path = config.stop_dict_path.clone();
            scheduler.schedule_at_fixed_rate(initial_delay, period, move || {
                reload_local(&dict_ref, custom_path.as_deref(), stop_path.as_deref());
            });
        }

        if config.enable_remote_dict {
            let remote = config
                .remote_config_path
                .as_ref()
                .map(|path| RemoteDictConfig::load(path))
                .unwrap_or_default();
            let monitors = build_monitors(&remote, &dict, config.enable_normalization);
            for monitor in monitors {
                scheduler.schedule_at_fixed_rate(initial_delay, period, move || monitor.run());
            }
        }

        Ok(AnalysisContext {
            config,
            dict,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dictionary(&self) -> &Arc<DictionaryStore> {
        &self.dict
    }

    /// Build an analyzer variant against this context's dictionaries.
    pub fn analyzer(&self, kind: AnalyzerKind) -> Result<Analyzer> {
        Analyzer::new(kind, self.config.clone(), Arc::clone(&self.dict))
    }

    /// Stop the background sync tasks and join their threads.
    pub fn shutdown(self) {
        self.scheduler.shutdown();
    }
}

fn build_monitors(
    remote: &RemoteDictConfig,
    dict: &Arc<DictionaryStore>,
    normalize: bool,
) -> Vec<Arc<RemoteDictionaryMonitor>> {
    let mut monitors = Vec::new();
    let sources = remote
        .custom_locations
        .iter()
        .map(|loc| (loc, RemoteDictKind::Custom))
        .chain(
            remote
                .stop_locations
                .iter()
                .map(|loc| (loc, RemoteDictKind::Stop)),
        );
    for (location, kind) in sources {
        match RemoteDictionaryMonitor::new(location, kind, Arc::clone(dict), normalize) {
            Ok(monitor) => monitors.push(Arc::new(monitor)),
            // A monitor that cannot even build its client is skipped; the
            // rest keep running.
            Err(e) => error!("cannot watch remote dict [{}]: {}", location, e),
        }
    }
    monitors
}

/// One tick of the local reload watcher. Errors are logged, never fatal:
/// only the initial load may abort.
fn reload_local(
    dict: &Arc<DictionaryStore>,
    custom_path: Option<&std::path::Path>,
    stop_path: Option<&std::path::Path>,
) {
    if let Some(path) = custom_path {
        match reload_custom(dict, path) {
            Ok(true) => info!("custom dictionary reloaded from {}", path.display()),
            Ok(false) => {}
            Err(e) => error!("custom dictionary reload failed: {}", e),
        }
    }
    if let Some(path) = stop_path {
        match reload_stop(dict, path) {
            Ok(true) => info!("stop dictionary reloaded from {}", path.display()),
            Ok(false) => {}
            Err(e) => error!("stop dictionary reload failed: {}", e),
        }
    }
}

fn reload_custom(dict: &Arc<DictionaryStore>, path: &std::path::Path) -> Result<bool> {
    let cache_path: PathBuf = cache::cache_path_for(path);
    if !cache::needs_rebuild(path, &cache_path)? {
        return Ok(false);
    }
    let lexicon = cache::load_custom_lexicon(path, LOCAL_DEFAULT_NATURE)?;
    dict.replace_base(lexicon);
    Ok(true)
}

fn reload_stop(dict: &Arc<DictionaryStore>, path: &std::path::Path) -> Result<bool> {
    let cache_path: PathBuf = cache::cache_path_for(path);
    if !cache::needs_rebuild(path, &cache_path)? {
        return Ok(false);
    }
    let words = cache::load_stop_words(path)?;
    dict.replace_stop_words(words);
    Ok(true)
}

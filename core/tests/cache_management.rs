// core/tests/cache_management.rs
//
// Integration tests for the local dictionary cache lifecycle:
// - binary cache creation on first load
// - zero rebuilds while the source is unchanged
// - invalidation and stale-cache deletion when the source moves forward
// - fatal error on a missing source

use hanseg_core::cache::{cache_path_for, load_custom_lexicon, load_stop_words, needs_rebuild};
use hanseg_core::{AnalysisContext, AnalysisError, AnalyzerKind, Config, Nature};
use std::fs;
use std::path::Path;

fn mtime(path: &Path) -> std::time::SystemTime {
    fs::metadata(path).expect("metadata").modified().expect("mtime")
}

#[test]
fn first_load_creates_cache_second_load_reuses_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("custom.txt");
    fs::write(&source, "中国 ns 100\n人民 n 90\n测试\n").expect("write source");
    let cache = cache_path_for(&source);
    assert!(!cache.exists());

    let lexicon = load_custom_lexicon(&source, Nature::N).expect("first load");
    assert_eq!(lexicon.len(), 3);
    assert!(cache.exists());
    let cache_stamp = mtime(&cache);

    // Idempotence: a second validation performs zero rebuilds, so the cache
    // file is untouched.
    assert!(!needs_rebuild(&source, &cache).expect("validate"));
    let again = load_custom_lexicon(&source, Nature::N).expect("second load");
    assert_eq!(again.len(), 3);
    assert_eq!(mtime(&cache), cache_stamp);
}

#[test]
fn source_update_invalidates_and_rebuilds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("custom.txt");
    fs::write(&source, "旧词 n 10\n").expect("write source");
    load_custom_lexicon(&source, Nature::N).expect("first load");
    let cache = cache_path_for(&source);
    assert!(cache.exists());

    fs::write(&source, "旧词 n 10\n新词 nz 7\n").expect("update source");
    let lexicon = load_custom_lexicon(&source, Nature::N).expect("reload");
    assert_eq!(lexicon.len(), 2);
    assert_eq!(lexicon.get("新词").map(|e| e.nature), Some(Nature::Nz));
}

#[test]
fn corrupt_cache_falls_back_to_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("custom.txt");
    fs::write(&source, "中国 ns 100\n").expect("write source");
    load_custom_lexicon(&source, Nature::N).expect("first load");

    let cache = cache_path_for(&source);
    fs::write(&cache, b"definitely not bincode").expect("corrupt cache");
    let lexicon = load_custom_lexicon(&source, Nature::N).expect("reload");
    assert_eq!(lexicon.get("中国").map(|e| e.frequency), Some(100));
}

#[test]
fn missing_source_is_a_fatal_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("never-written.txt");
    let err = load_custom_lexicon(&source, Nature::N).expect_err("fatal");
    assert!(matches!(err, AnalysisError::MissingDictionary { .. }));
    let message = err.to_string();
    assert!(message.contains("never-written.txt"));
}

#[test]
fn stop_word_cache_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("stop.txt");
    fs::write(&source, "的\n了\n是\n").expect("write source");

    let words = load_stop_words(&source).expect("first load");
    assert_eq!(words.len(), 3);
    let cache = cache_path_for(&source);
    assert!(cache.exists());

    let again = load_stop_words(&source).expect("cached load");
    assert_eq!(again, words);
}

#[test]
fn context_startup_builds_caches_for_both_dictionaries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let custom = dir.path().join("custom.txt");
    let stop = dir.path().join("stop.txt");
    fs::write(&custom, "中国 ns 100\n测试 vn 50\n").expect("write custom");
    fs::write(&stop, "的\n").expect("write stop");

    let config = Config {
        custom_dict_path: Some(custom.clone()),
        stop_dict_path: Some(stop.clone()),
        enable_stop_dictionary: true,
        enable_remote_dict: false,
        ..Config::default()
    };
    let context = AnalysisContext::new(config).expect("build context");
    assert!(cache_path_for(&custom).exists());
    assert!(cache_path_for(&stop).exists());

    let analyzer = context.analyzer(AnalyzerKind::Standard).expect("analyzer");
    let tokens = analyzer.analyze("中国的测试");
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["中国", "测试"]);
    context.shutdown();
}

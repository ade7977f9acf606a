// Tests for statistics accumulation and snapshot persistence

use anteater_core::config::StatsConfig;
use anteater_core::stats::{CrawlStatistics, StatsAccumulator, tokenize};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn accumulator_at(dir: &TempDir) -> StatsAccumulator {
    StatsAccumulator::new("ics.uci.edu").with_snapshot(dir.path().join("state.json"), 1)
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_persist_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    let acc = accumulator_at(&dir);
    acc.record_page(
        "http://vision.ics.uci.edu/people",
        &tokenize("Computer vision research at UCI, vision lab"),
    );
    acc.record_page(
        "http://www.ics.uci.edu/about",
        &tokenize("About the school of information and computer sciences"),
    );
    acc.persist().unwrap();

    let restored = StatsAccumulator::restore(&dir.path().join("state.json"), "ics.uci.edu");
    assert_eq!(restored.snapshot(), acc.snapshot());
}

#[test]
fn test_snapshot_uses_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let acc = accumulator_at(&dir);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("hello world"));
    acc.persist().unwrap();

    let raw = fs::read_to_string(dir.path().join("state.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    for key in [
        "wordFrequency",
        "uniqueLinks",
        "maxWordLink",
        "maxWords",
        "domainList",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(value["maxWords"], 2);
    assert_eq!(value["domainList"]["a.ics.uci.edu"], 1);
}

#[test]
fn test_persist_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let acc = accumulator_at(&dir);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("hello"));
    acc.persist().unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["state.json".to_string()]);
}

#[test]
fn test_persist_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("state.json");
    let acc = StatsAccumulator::new("ics.uci.edu").with_snapshot(path.clone(), 1);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("hello"));
    acc.persist().unwrap();
    assert!(path.exists());
}

#[test]
fn test_restore_missing_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let acc = StatsAccumulator::restore(&dir.path().join("absent.json"), "ics.uci.edu");
    assert_eq!(acc.snapshot(), CrawlStatistics::default());
}

#[test]
fn test_restore_corrupt_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{\"wordFrequency\": [truncated").unwrap();

    let acc = StatsAccumulator::restore(&path, "ics.uci.edu");
    assert_eq!(acc.unique_page_count(), 0);
}

#[test]
fn test_restore_partial_snapshot_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, r#"{"uniqueLinks": ["http://a.ics.uci.edu/"]}"#).unwrap();

    let acc = StatsAccumulator::restore(&path, "ics.uci.edu");
    let stats = acc.snapshot();
    assert_eq!(stats.unique_page_count(), 1);
    assert!(stats.word_frequency.is_empty());
    assert_eq!(stats.max_words, 0);
}

#[test]
fn test_restored_urls_are_not_recounted() {
    let dir = TempDir::new().unwrap();
    let acc = accumulator_at(&dir);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("graphics"));
    acc.persist().unwrap();

    let restored = StatsAccumulator::restore(&dir.path().join("state.json"), "ics.uci.edu");
    assert!(!restored.record_page("http://a.ics.uci.edu/", &tokenize("graphics")));
    assert_eq!(restored.snapshot().word_frequency.get("graphics"), Some(&1));
}

#[test]
fn test_from_config_resumes_and_checkpoints() {
    let dir = TempDir::new().unwrap();
    let config = StatsConfig {
        state_path: dir.path().join("state.json"),
        checkpoint_interval: 2,
        ..StatsConfig::default()
    };

    let acc = StatsAccumulator::from_config(&config);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("one"));
    acc.checkpoint_if_due();
    assert!(!config.state_path.exists());

    acc.record_page("http://b.ics.uci.edu/", &tokenize("two"));
    acc.checkpoint_if_due();
    assert!(config.state_path.exists());

    let resumed = StatsAccumulator::from_config(&config);
    assert_eq!(resumed.unique_page_count(), 2);
}

#[test]
fn test_failed_checkpoint_does_not_panic() {
    let dir = TempDir::new().unwrap();
    // A directory where the snapshot file should go makes the rename fail.
    let path = dir.path().join("state.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    let acc = StatsAccumulator::new("ics.uci.edu").with_snapshot(path, 1);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("hello"));
    acc.checkpoint_if_due();
    assert!(acc.persist().is_err());
    assert_eq!(acc.unique_page_count(), 1);
}

#[test]
fn test_failed_checkpoint_retries_on_next_call() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    let acc = StatsAccumulator::new("ics.uci.edu").with_snapshot(path.clone(), 2);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("one"));
    acc.record_page("http://b.ics.uci.edu/", &tokenize("two"));
    acc.checkpoint_if_due();
    assert_eq!(acc.pending_pages(), 2);

    // Unblock the path; the retry must not wait for two more pages.
    fs::remove_dir_all(&path).unwrap();
    acc.checkpoint_if_due();
    assert_eq!(acc.pending_pages(), 0);
    assert_eq!(CrawlStatistics::load(&path).unwrap().unique_page_count(), 2);
}

#[test]
fn test_failed_persist_keeps_pages_pending() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    let acc = StatsAccumulator::new("ics.uci.edu").with_snapshot(path.clone(), 5);
    acc.record_page("http://a.ics.uci.edu/", &tokenize("one"));
    assert!(acc.persist().is_err());
    assert_eq!(acc.pending_pages(), 1);

    fs::remove_dir_all(&path).unwrap();
    acc.persist().unwrap();
    assert_eq!(acc.pending_pages(), 0);
}

// ============================================================================
// Accumulation
// ============================================================================

#[test]
fn test_double_record_does_not_double_count() {
    let acc = StatsAccumulator::new("ics.uci.edu");
    let words = tokenize("machine learning machine");
    assert!(acc.record_page("http://ml.ics.uci.edu/", &words));
    assert!(!acc.record_page("http://ml.ics.uci.edu/", &words));

    let stats = acc.snapshot();
    assert_eq!(stats.unique_page_count(), 1);
    assert_eq!(stats.word_frequency.get("machine"), Some(&2));
    assert_eq!(stats.domain_list.get("ml.ics.uci.edu"), Some(&1));
}

#[test]
fn test_word_ranking_tie_break() {
    let acc = StatsAccumulator::new("ics.uci.edu");
    acc.record_page("http://a.ics.uci.edu/", &tokenize("pear apple pear apple fig"));
    acc.record_page("http://b.ics.uci.edu/", &tokenize("banana"));

    assert_eq!(
        acc.snapshot().top_words(10),
        vec![
            ("apple".to_string(), 2),
            ("pear".to_string(), 2),
            ("banana".to_string(), 1),
            ("fig".to_string(), 1),
        ]
    );
}

#[test]
fn test_subdomains_sorted_and_parent_excluded() {
    let acc = StatsAccumulator::new("ics.uci.edu");
    acc.record_page("http://www.ics.uci.edu/a", &tokenize("x"));
    acc.record_page("http://ics.uci.edu/b", &tokenize("x"));
    acc.record_page("http://archive.ics.uci.edu/c", &tokenize("x"));
    acc.record_page("http://www.ics.uci.edu/d", &tokenize("x"));
    acc.record_page("http://www.cs.uci.edu/e", &tokenize("x"));

    assert_eq!(
        acc.snapshot().subdomains(),
        vec![
            ("archive.ics.uci.edu".to_string(), 1),
            ("www.ics.uci.edu".to_string(), 2),
        ]
    );
}

#[test]
fn test_concurrent_recording() {
    let acc = Arc::new(StatsAccumulator::new("ics.uci.edu"));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let acc = acc.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    // Half the URLs overlap between threads.
                    let url = format!("http://a.ics.uci.edu/{}", (t % 2) * 1000 + i);
                    acc.record_page(&url, &tokenize("shared word"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = acc.snapshot();
    assert_eq!(stats.unique_page_count(), 100);
    assert_eq!(stats.word_frequency.get("shared"), Some(&100));
    assert_eq!(stats.domain_list.get("a.ics.uci.edu"), Some(&100));
}

// Crawl-wide statistics with durable snapshots.
//
// Mutations happen under one lock; snapshot writes copy the state out
// first and do the file I/O after the lock is released.

use crate::config::StatsConfig;
use crate::error::Result;
use crate::stopwords::is_stop_word;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z][a-zA-Z0-9]*'?[a-zA-Z0-9]*").expect("word pattern is valid")
});

/// Lowercased words: a letter, then letters or digits, with at most one
/// apostrophe inside.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Everything the final report needs. Field names on disk match the
/// snapshot format read by earlier crawls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrawlStatistics {
    pub word_frequency: BTreeMap<String, u64>,
    pub unique_links: BTreeSet<String>,
    pub max_word_link: String,
    pub max_words: usize,
    pub domain_list: BTreeMap<String, u64>,
}

impl CrawlStatistics {
    pub fn unique_page_count(&self) -> usize {
        self.unique_links.len()
    }

    /// The `n` most frequent words, most frequent first; ties in
    /// alphabetical order.
    pub fn top_words(&self, n: usize) -> Vec<(String, u64)> {
        let mut words: Vec<(&String, &u64)> = self.word_frequency.iter().collect();
        words.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        words
            .into_iter()
            .take(n)
            .map(|(w, c)| (w.clone(), *c))
            .collect()
    }

    /// Subdomains and their page counts, alphabetical by host.
    pub fn subdomains(&self) -> Vec<(String, u64)> {
        self.domain_list
            .iter()
            .map(|(h, c)| (h.clone(), *c))
            .collect()
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a snapshot atomically: a temp file next to the target is
    /// synced and then renamed over it.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let encoded = serde_json::to_vec(self)?;
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&encoded)?;
        file.sync_all()?;

        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

struct Inner {
    stats: CrawlStatistics,
    // Bumped on every recorded page; lets writers skip stale copies.
    generation: u64,
    pending: u64,
}

pub struct StatsAccumulator {
    inner: Mutex<Inner>,
    parent_suffix: String,
    snapshot_path: Option<PathBuf>,
    checkpoint_interval: u64,
    // Serialises file writes and remembers the newest generation on disk.
    written: Mutex<u64>,
}

impl StatsAccumulator {
    /// In-memory accumulator tallying subdomains of `parent_domain`.
    pub fn new(parent_domain: &str) -> Self {
        Self::from_statistics(CrawlStatistics::default(), parent_domain)
    }

    pub fn from_statistics(stats: CrawlStatistics, parent_domain: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                stats,
                generation: 0,
                pending: 0,
            }),
            parent_suffix: format!(".{}", parent_domain.trim().trim_matches('.').to_lowercase()),
            snapshot_path: None,
            checkpoint_interval: 1,
            written: Mutex::new(0),
        }
    }

    /// Persist to `path` every `interval` recorded pages.
    pub fn with_snapshot(mut self, path: PathBuf, interval: u64) -> Self {
        self.snapshot_path = Some(path);
        self.checkpoint_interval = interval.max(1);
        self
    }

    /// Resume from the snapshot at `path`. A missing or unreadable file
    /// starts an empty crawl instead of failing.
    pub fn restore(path: &Path, parent_domain: &str) -> Self {
        let stats = if path.exists() {
            match CrawlStatistics::load(path) {
                Ok(stats) => {
                    info!(
                        path = %path.display(),
                        pages = stats.unique_page_count(),
                        "restored crawl statistics"
                    );
                    stats
                }
                Err(e) => {
                    warn!(
                        "Ignoring unreadable statistics snapshot {}: {}",
                        path.display(),
                        e
                    );
                    CrawlStatistics::default()
                }
            }
        } else {
            debug!(path = %path.display(), "no statistics snapshot, starting fresh");
            CrawlStatistics::default()
        };
        Self::from_statistics(stats, parent_domain)
    }

    /// Restore from the configured state path with its checkpoint interval.
    pub fn from_config(config: &StatsConfig) -> Self {
        let path = config.resolved_state_path();
        Self::restore(&path, &config.parent_domain)
            .with_snapshot(path, config.checkpoint_interval)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Host counted in the subdomain table, if `url` is under the parent
    /// domain and is not the parent itself.
    pub fn subdomain_of(&self, url: &str) -> Option<String> {
        let host = Url::parse(url).ok()?.host_str()?.to_lowercase();
        (host.len() > self.parent_suffix.len() && host.ends_with(&self.parent_suffix))
            .then_some(host)
    }

    /// Tally one accepted page. Returns false, changing nothing, when the
    /// URL was already counted.
    pub fn record_page(&self, url: &str, words: &[String]) -> bool {
        let subdomain = self.subdomain_of(url);

        let mut inner = self.inner.lock();
        let stats = &mut inner.stats;
        if !stats.unique_links.insert(url.to_string()) {
            debug!(url, "page already counted");
            return false;
        }

        if words.len() > stats.max_words {
            stats.max_words = words.len();
            stats.max_word_link = url.to_string();
        }

        for word in words {
            let word = word.to_lowercase();
            if !is_stop_word(&word) {
                *stats.word_frequency.entry(word).or_insert(0) += 1;
            }
        }

        if let Some(host) = subdomain {
            *stats.domain_list.entry(host).or_insert(0) += 1;
        }

        inner.generation += 1;
        inner.pending += 1;
        true
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> CrawlStatistics {
        self.inner.lock().stats.clone()
    }

    pub fn unique_page_count(&self) -> usize {
        self.inner.lock().stats.unique_page_count()
    }

    /// Write the current state to the snapshot path, if one is set.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        let (stats, generation, taken) = {
            let mut inner = self.inner.lock();
            let taken = std::mem::take(&mut inner.pending);
            (inner.stats.clone(), inner.generation, taken)
        };
        self.write_snapshot(path, &stats, generation)
            .inspect_err(|_| self.restore_pending(taken))
    }

    /// Persist if enough pages were recorded since the last write. Write
    /// failures are logged; the crawl carries on with the previous file.
    pub fn checkpoint_if_due(&self) {
        let Some(path) = self.snapshot_path.as_deref() else {
            return;
        };
        let due = {
            let mut inner = self.inner.lock();
            if inner.pending >= self.checkpoint_interval {
                let taken = std::mem::take(&mut inner.pending);
                Some((inner.stats.clone(), inner.generation, taken))
            } else {
                None
            }
        };
        if let Some((stats, generation, taken)) = due
            && let Err(e) = self.write_snapshot(path, &stats, generation)
        {
            self.restore_pending(taken);
            warn!("Failed to write statistics snapshot {}: {}", path.display(), e);
        }
    }

    // A failed write leaves its pages due for the next checkpoint.
    fn restore_pending(&self, taken: u64) {
        self.inner.lock().pending += taken;
    }

    pub fn pending_pages(&self) -> u64 {
        self.inner.lock().pending
    }

    fn write_snapshot(&self, path: &Path, stats: &CrawlStatistics, generation: u64) -> Result<()> {
        let mut written = self.written.lock();
        if generation < *written {
            debug!(generation, newest = *written, "skipping stale snapshot");
            return Ok(());
        }
        stats.save(path)?;
        *written = generation;
        debug!(path = %path.display(), pages = stats.unique_page_count(), "snapshot written");
        Ok(())
    }
}

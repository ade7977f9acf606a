// Crawler configuration.
//
// Every section has working defaults, so an empty JSON object (or no file
// at all) yields the stock ICS crawl. Fields missing from a file fall back
// to their defaults.

use crate::error::{CoreError, Result};
use anteater_scanner::dedup::{DEFAULT_BLOCKS, DEFAULT_MAX_DISTANCE};
use anteater_scanner::fetcher::DEFAULT_USER_AGENT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "ics.uci.edu",
    "cs.uci.edu",
    "informatics.uci.edu",
    "stat.uci.edu",
];

pub const DEFAULT_TRAP_KEYWORDS: &[&str] = &["calendar", "appointment"];

pub const DEFAULT_BUDGET_MARKERS: &[&str] = &["wiki", "gitlab"];

pub const DEFAULT_VCS_MARKERS: &[&str] = &["gitlab"];

/// Non-HTML file types never worth fetching.
pub const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    // styles and scripts
    "css", "js", //
    // images
    "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "svg", "webp", "psd", //
    // audio and video
    "mid", "mp2", "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv",
    "rm", "smil", "wmv", "swf", "wma", //
    // documents
    "pdf", "ps", "eps", "tex", "ppt", "pptx", "ppsx", "doc", "docx", "xls", "xlsx", "odt", "odp",
    "ods", "rtf", "epub", "thmx", "mso", "bib", //
    // data
    "names", "data", "dat", "csv", "arff", "cnf", "sha1", "json", "sql", "ipynb", //
    // archives and binaries
    "exe", "bz2", "tar", "msi", "bin", "7z", "dmg", "iso", "dll", "tgz", "jar", "war", "apk",
    "img", "zip", "rar", "gz", //
    // source code
    "py", "java", "c", "cpp", "h", "hpp", "cc", "m", "r",
];

pub const DEFAULT_QUERY_BUDGET: u32 = 5;

pub const DEFAULT_MIN_TEXT_CHARS: usize = 300;

pub const DEFAULT_PARENT_DOMAIN: &str = "ics.uci.edu";

pub const DEFAULT_STATE_PATH: &str = "crawl_state.json";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Hosts must be a strict subdomain of one of these.
    pub allowed_domains: Vec<String>,
    /// Path substrings marking calendar and booking generators.
    pub trap_keywords: Vec<String>,
    /// Host substrings that get a per-path query budget.
    pub budget_markers: Vec<String>,
    /// Host substrings identifying version-control web front ends.
    pub vcs_markers: Vec<String>,
    /// Distinct query variants admitted per stripped path on budgeted hosts.
    pub query_budget: u32,
    pub blocked_extensions: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_domains: strings(DEFAULT_ALLOWED_DOMAINS),
            trap_keywords: strings(DEFAULT_TRAP_KEYWORDS),
            budget_markers: strings(DEFAULT_BUDGET_MARKERS),
            vcs_markers: strings(DEFAULT_VCS_MARKERS),
            query_budget: DEFAULT_QUERY_BUDGET,
            blocked_extensions: strings(DEFAULT_BLOCKED_EXTENSIONS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DedupConfig {
    /// Hamming distance still considered the same content.
    pub max_distance: u32,
    /// Lookup blocks the 64-bit fingerprint is split into.
    pub blocks: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            blocks: DEFAULT_BLOCKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Pages with this many visible characters or fewer are skipped.
    pub min_text_chars: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Domain whose subdomains are tallied in the report.
    pub parent_domain: String,
    /// Snapshot file; `~` is expanded.
    pub state_path: PathBuf,
    /// Accepted pages between snapshot writes.
    pub checkpoint_interval: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            parent_domain: DEFAULT_PARENT_DOMAIN.to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            checkpoint_interval: 10,
        }
    }
}

impl StatsConfig {
    pub fn resolved_state_path(&self) -> PathBuf {
        expand_path(&self.state_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause each worker takes between requests.
    pub politeness_delay_ms: u64,
    /// Stop after this many fetches; 0 means no limit.
    pub max_pages: usize,
    pub workers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            politeness_delay_ms: 500,
            max_pages: 0,
            workers: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrawlerConfig {
    pub policy: PolicyConfig,
    pub dedup: DedupConfig,
    pub processor: ProcessorConfig,
    pub stats: StatsConfig,
    pub fetch: FetchConfig,
}

impl CrawlerConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand_path(path);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CoreError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: CrawlerConfig = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.policy.allowed_domains.is_empty() {
            errors.push("policy.allowed_domains must not be empty".to_string());
        }
        if self
            .policy
            .allowed_domains
            .iter()
            .any(|d| d.trim().trim_matches('.').is_empty())
        {
            errors.push("policy.allowed_domains contains a blank entry".to_string());
        }
        if self.policy.query_budget == 0 {
            errors.push("policy.query_budget must be positive".to_string());
        }
        if self.dedup.blocks == 0 || self.dedup.blocks > 64 {
            errors.push("dedup.blocks must be between 1 and 64".to_string());
        }
        if self.dedup.blocks <= self.dedup.max_distance {
            errors.push("dedup.blocks must be greater than dedup.max_distance".to_string());
        }
        if self.stats.parent_domain.trim().is_empty() {
            errors.push("stats.parent_domain must not be empty".to_string());
        }
        if self.stats.checkpoint_interval == 0 {
            errors.push("stats.checkpoint_interval must be positive".to_string());
        }
        if self.fetch.workers == 0 {
            errors.push("fetch.workers must be positive".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            errors.push("fetch.timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Config(errors.join("; ")))
        }
    }
}

/// Expand a leading `~` in a path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

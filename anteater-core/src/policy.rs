// URL admission control.
//
// A URL is admitted to the frontier only if it passes an ordered list of
// rules; evaluation stops at the first rule that rejects. Every rule is a
// small type over the parsed URL so it can be tested and tuned on its own.

use crate::config::PolicyConfig;
use crate::error::{CoreError, Result};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use url::Url;

/// Low-information views served by version-control front ends.
pub const VCS_VIEW_PATTERN: &str =
    r"(?i)/(?:-/)?(?:commits?|compare|blame|raw|tree|network|graphs?|diffs?)(?:/|$)";

/// Dataset listings filtered by file format.
pub const DATASET_LISTING_PATTERN: &str = r"(?i)datasets?(?:\.php)?\?(?:.*&)?format=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Unparsable,
    Scheme,
    Domain,
    TrapKeyword,
    RepeatedSegment,
    QueryBudget,
    VcsView,
    DatasetListing,
    Extension,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Unparsable => "unparsable",
            RuleKind::Scheme => "scheme",
            RuleKind::Domain => "domain",
            RuleKind::TrapKeyword => "trap_keyword",
            RuleKind::RepeatedSegment => "repeated_segment",
            RuleKind::QueryBudget => "query_budget",
            RuleKind::VcsView => "vcs_view",
            RuleKind::DatasetListing => "dataset_listing",
            RuleKind::Extension => "extension",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(RuleKind),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

pub trait AdmissionRule: Send + Sync {
    fn kind(&self) -> RuleKind;

    /// True when the URL must not be fetched.
    fn rejects(&self, url: &Url) -> bool;
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_lowercase()
}

/// Only http(s) URLs with a host.
pub struct SchemeRule;

impl AdmissionRule for SchemeRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Scheme
    }

    fn rejects(&self, url: &Url) -> bool {
        !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty)
    }
}

/// Host must be a strict subdomain of an allowed domain.
pub struct DomainRule {
    suffixes: Vec<String>,
}

impl DomainRule {
    pub fn new(domains: &[String]) -> Self {
        let suffixes = lowercase_all(domains)
            .into_iter()
            .map(|d| format!(".{}", d.trim_matches('.')))
            .collect();
        Self { suffixes }
    }
}

impl AdmissionRule for DomainRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Domain
    }

    fn rejects(&self, url: &Url) -> bool {
        let host = host_of(url);
        !self
            .suffixes
            .iter()
            .any(|suffix| host.len() > suffix.len() && host.ends_with(suffix.as_str()))
    }
}

/// Calendar and booking generators.
pub struct TrapKeywordRule {
    keywords: Vec<String>,
}

impl TrapKeywordRule {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: lowercase_all(keywords),
        }
    }
}

impl AdmissionRule for TrapKeywordRule {
    fn kind(&self) -> RuleKind {
        RuleKind::TrapKeyword
    }

    fn rejects(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.keywords.iter().any(|k| path.contains(k.as_str()))
    }
}

/// A directory segment appearing twice in the same path, as produced by
/// relative links that loop back on themselves.
pub struct RepeatedSegmentRule;

impl RepeatedSegmentRule {
    pub fn has_repeated_directory(path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        // The last piece is the file name (or empty for a trailing slash).
        let directories = &segments[..segments.len().saturating_sub(1)];
        let mut seen = HashSet::new();
        directories
            .iter()
            .filter(|s| !s.is_empty())
            .any(|s| !seen.insert(*s))
    }
}

impl AdmissionRule for RepeatedSegmentRule {
    fn kind(&self) -> RuleKind {
        RuleKind::RepeatedSegment
    }

    fn rejects(&self, url: &Url) -> bool {
        Self::has_repeated_directory(url.path())
    }
}

/// Distinct query variants seen per query-stripped path.
///
/// Counts only ever grow. A variant that was already admitted stays
/// admitted without consuming budget.
#[derive(Debug, Default)]
pub struct TrapBudget {
    variants: HashMap<String, HashSet<String>>,
}

impl TrapBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `variant` under `key`; false once `limit` other variants
    /// already hold the key.
    pub fn admit(&mut self, key: &str, variant: &str, limit: u32) -> bool {
        let seen = self.variants.entry(key.to_string()).or_default();
        if seen.contains(variant) {
            return true;
        }
        if seen.len() >= limit as usize {
            return false;
        }
        seen.insert(variant.to_string());
        true
    }

    pub fn visits(&self, key: &str) -> usize {
        self.variants.get(key).map_or(0, HashSet::len)
    }

    pub fn tracked_paths(&self) -> usize {
        self.variants.len()
    }
}

/// Bounded query variants per path on wiki and VCS hosts.
pub struct QueryBudgetRule {
    markers: Vec<String>,
    limit: u32,
    budget: Mutex<TrapBudget>,
}

impl QueryBudgetRule {
    pub fn new(markers: &[String], limit: u32) -> Self {
        Self {
            markers: lowercase_all(markers),
            limit,
            budget: Mutex::new(TrapBudget::new()),
        }
    }

    /// Host and path without query or fragment.
    pub fn budget_key(url: &Url) -> String {
        format!("{}{}", host_of(url), url.path())
    }

    pub fn visits(&self, url: &Url) -> usize {
        self.budget.lock().visits(&Self::budget_key(url))
    }
}

impl AdmissionRule for QueryBudgetRule {
    fn kind(&self) -> RuleKind {
        RuleKind::QueryBudget
    }

    fn rejects(&self, url: &Url) -> bool {
        let host = host_of(url);
        if !self.markers.iter().any(|m| host.contains(m.as_str())) {
            return false;
        }
        let key = Self::budget_key(url);
        let variant = url.query().unwrap_or_default();
        !self.budget.lock().admit(&key, variant, self.limit)
    }
}

/// Commit, diff, blame, raw, tree and graph views on VCS hosts.
pub struct VcsViewRule {
    markers: Vec<String>,
    views: Regex,
}

impl VcsViewRule {
    pub fn new(markers: &[String]) -> Result<Self> {
        Ok(Self {
            markers: lowercase_all(markers),
            views: compile(VCS_VIEW_PATTERN)?,
        })
    }
}

impl AdmissionRule for VcsViewRule {
    fn kind(&self) -> RuleKind {
        RuleKind::VcsView
    }

    fn rejects(&self, url: &Url) -> bool {
        let host = host_of(url);
        self.markers.iter().any(|m| host.contains(m.as_str())) && self.views.is_match(url.path())
    }
}

/// Format-filtered dataset listing pages.
pub struct DatasetListingRule {
    pattern: Regex,
}

impl DatasetListingRule {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: compile(DATASET_LISTING_PATTERN)?,
        })
    }
}

impl AdmissionRule for DatasetListingRule {
    fn kind(&self) -> RuleKind {
        RuleKind::DatasetListing
    }

    fn rejects(&self, url: &Url) -> bool {
        match url.query() {
            Some(query) => self.pattern.is_match(&format!("{}?{}", url.path(), query)),
            None => false,
        }
    }
}

/// Binary, media, archive and source files.
pub struct ExtensionRule {
    blocked: HashSet<String>,
}

impl ExtensionRule {
    pub fn new(extensions: &[String]) -> Self {
        let blocked = lowercase_all(extensions)
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        Self { blocked }
    }

    pub fn extension(path: &str) -> Option<String> {
        let file_name = path.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}

impl AdmissionRule for ExtensionRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Extension
    }

    fn rejects(&self, url: &Url) -> bool {
        Self::extension(url.path()).is_some_and(|ext| self.blocked.contains(&ext))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| CoreError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

pub struct AdmissionPolicy {
    rules: Vec<Box<dyn AdmissionRule>>,
}

impl AdmissionPolicy {
    /// The standard rule chain, in evaluation order.
    pub fn new(config: &PolicyConfig) -> Result<Self> {
        let rules: Vec<Box<dyn AdmissionRule>> = vec![
            Box::new(SchemeRule),
            Box::new(DomainRule::new(&config.allowed_domains)),
            Box::new(TrapKeywordRule::new(&config.trap_keywords)),
            Box::new(RepeatedSegmentRule),
            Box::new(QueryBudgetRule::new(
                &config.budget_markers,
                config.query_budget,
            )),
            Box::new(VcsViewRule::new(&config.vcs_markers)?),
            Box::new(DatasetListingRule::new()?),
            Box::new(ExtensionRule::new(&config.blocked_extensions)),
        ];
        Ok(Self::with_rules(rules))
    }

    pub fn with_rules(rules: Vec<Box<dyn AdmissionRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.kind().as_str()).collect()
    }

    /// Decide on a URL, naming the rule that rejected it.
    pub fn evaluate(&self, url: &str) -> Admission {
        let Ok(parsed) = Url::parse(url) else {
            debug!(url, rule = RuleKind::Unparsable.as_str(), "rejected");
            return Admission::Rejected(RuleKind::Unparsable);
        };

        for rule in &self.rules {
            if rule.rejects(&parsed) {
                debug!(url, rule = rule.kind().as_str(), "rejected");
                return Admission::Rejected(rule.kind());
            }
        }
        Admission::Admitted
    }

    pub fn is_admissible(&self, url: &str) -> bool {
        self.evaluate(url).is_admitted()
    }

    /// Keep the admissible URLs, in order.
    pub fn filter<I, S>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter(|u| self.is_admissible(u.as_ref()))
            .map(|u| u.as_ref().to_string())
            .collect()
    }
}

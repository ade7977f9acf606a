// Report generation from crawl statistics

use crate::config::DEFAULT_PARENT_DOMAIN;
use crate::stats::CrawlStatistics;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

pub const DEFAULT_TOP_WORDS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Number of words listed in the frequency section.
    pub top_n: usize,
    /// Shown in the subdomain section heading.
    pub parent_domain: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_WORDS,
            parent_domain: DEFAULT_PARENT_DOMAIN.to_string(),
        }
    }
}

/// Condensed view of the statistics, used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub unique_pages: usize,
    pub longest_page: Option<LongestPage>,
    pub top_words: Vec<WordCount>,
    pub parent_domain: String,
    pub subdomains: Vec<SubdomainCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongestPage {
    pub url: String,
    pub words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubdomainCount {
    pub host: String,
    pub pages: u64,
}

impl ReportSummary {
    pub fn from_statistics(stats: &CrawlStatistics, options: &ReportOptions) -> Self {
        let longest_page = (!stats.max_word_link.is_empty()).then(|| LongestPage {
            url: stats.max_word_link.clone(),
            words: stats.max_words,
        });

        Self {
            unique_pages: stats.unique_page_count(),
            longest_page,
            top_words: stats
                .top_words(options.top_n)
                .into_iter()
                .map(|(word, count)| WordCount { word, count })
                .collect(),
            parent_domain: options.parent_domain.clone(),
            subdomains: stats
                .subdomains()
                .into_iter()
                .map(|(host, pages)| SubdomainCount { host, pages })
                .collect(),
        }
    }
}

/// Plain-text report with four numbered sections.
pub fn generate_report(stats: &CrawlStatistics, options: &ReportOptions) -> String {
    let summary = ReportSummary::from_statistics(stats, options);
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                           ANTEATER CRAWL REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str("1. Unique pages\n\n");
    report.push_str(&format!("   {}\n\n", summary.unique_pages));

    report.push_str("2. Longest page\n\n");
    match &summary.longest_page {
        Some(page) => report.push_str(&format!("   {} ({} words)\n\n", page.url, page.words)),
        None => report.push_str("   (none)\n\n"),
    }

    report.push_str(&format!("3. Top {} words\n\n", options.top_n));
    if summary.top_words.is_empty() {
        report.push_str("   (none)\n");
    }
    let width = summary
        .top_words
        .iter()
        .map(|w| w.word.len())
        .max()
        .unwrap_or(0);
    for (idx, entry) in summary.top_words.iter().enumerate() {
        report.push_str(&format!(
            "   {:>3}. {:<width$}  {}\n",
            idx + 1,
            entry.word,
            entry.count,
            width = width
        ));
    }
    report.push('\n');

    report.push_str(&format!(
        "4. Subdomains of {} ({})\n\n",
        summary.parent_domain,
        summary.subdomains.len()
    ));
    for entry in &summary.subdomains {
        report.push_str(&format!("   {}, {}\n", entry.host, entry.pages));
    }
    report.push('\n');

    report.push_str(RULE);
    report
}

pub fn generate_json_report(
    stats: &CrawlStatistics,
    options: &ReportOptions,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ReportSummary::from_statistics(stats, options))
}

/// Render in the requested format.
pub fn render_report(
    stats: &CrawlStatistics,
    options: &ReportOptions,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_report(stats, options)),
        ReportFormat::Json => generate_json_report(stats, options),
    }
}

pub fn write_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

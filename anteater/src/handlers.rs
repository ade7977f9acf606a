use anteater_core::config::{CrawlerConfig, expand_path};
use anteater_core::crawl::{CrawlOptions, CrawlSummary, execute_crawl};
use anteater_core::policy::{Admission, AdmissionPolicy};
use anteater_core::report::{ReportFormat, ReportOptions, render_report, write_report};
use anteater_core::stats::CrawlStatistics;
use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

/// Department home pages crawled when no seeds are given.
pub const DEFAULT_SEEDS: &[&str] = &[
    "https://www.ics.uci.edu",
    "https://www.cs.uci.edu",
    "https://www.informatics.uci.edu",
    "https://www.stat.uci.edu",
];

// Helper functions for crawl handler

/// Seeds from a file, the `--url` arguments, or the defaults, in that order
pub fn load_urls_from_source(urls: &[Url], hosts_file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if !urls.is_empty() {
        Ok(urls.iter().map(|u| u.as_str().to_string()).collect())
    } else {
        Ok(DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

/// The configuration file if one was given, otherwise the defaults
pub fn load_config(path: Option<&PathBuf>) -> Result<CrawlerConfig> {
    match path {
        Some(path) => Ok(CrawlerConfig::load(path)?),
        None => Ok(CrawlerConfig::default()),
    }
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct CrawlOverrides {
    pub workers: Option<usize>,
    pub max_pages: Option<usize>,
    pub delay_ms: Option<u64>,
    pub state_path: Option<PathBuf>,
}

impl CrawlOverrides {
    pub fn apply(&self, config: &mut CrawlerConfig) -> Result<()> {
        if let Some(workers) = self.workers {
            config.fetch.workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            config.fetch.max_pages = max_pages;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.fetch.politeness_delay_ms = delay_ms;
        }
        if let Some(ref state_path) = self.state_path {
            config.stats.state_path = state_path.clone();
        }
        config.validate()?;
        Ok(())
    }
}

/// Write the default configuration as pretty JSON
pub fn write_default_config(path: &Path, force: bool) -> Result<PathBuf> {
    let path = expand_path(path);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&CrawlerConfig::default())?;
    fs::write(&path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Read a snapshot for reporting. Unlike a crawl restore, a missing file
/// is an error here.
pub fn load_statistics(path: &Path) -> Result<CrawlStatistics> {
    let path = expand_path(path);
    if !path.exists() {
        bail!("No statistics snapshot at {}", path.display());
    }
    CrawlStatistics::load(&path)
        .with_context(|| format!("Failed to read statistics snapshot {}", path.display()))
}

pub fn parse_format(format: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(format).ok_or_else(|| anyhow!("Unknown report format '{}'", format))
}

/// Render the report and either save it or return it for printing
pub fn produce_report(
    stats: &CrawlStatistics,
    options: &ReportOptions,
    format: ReportFormat,
    output: Option<&PathBuf>,
) -> Result<Option<String>> {
    let content = render_report(stats, options, format)?;
    match output {
        Some(path) => {
            let path = expand_path(path);
            write_report(&content, &path)
                .with_context(|| format!("Failed to save report to {}", path.display()))?;
            Ok(None)
        }
        None => Ok(Some(content)),
    }
}

/// Run a crawl and render its report from the crawler's own statistics,
/// so a failed final snapshot write still yields a complete report.
pub async fn crawl_and_report(
    options: CrawlOptions,
    report_options: &ReportOptions,
    format: ReportFormat,
    output: Option<&PathBuf>,
) -> Result<(CrawlSummary, Option<String>)> {
    let summary = execute_crawl(options, None).await?;
    let report = produce_report(&summary.statistics, report_options, format, output)?;
    Ok((summary, report))
}

/// Evaluate each URL in order against the policy
pub fn check_urls(policy: &AdmissionPolicy, urls: &[String]) -> Vec<(String, Admission)> {
    urls.iter()
        .map(|url| (url.clone(), policy.evaluate(url)))
        .collect()
}

pub fn format_verdict(url: &str, admission: &Admission) -> String {
    match admission {
        Admission::Admitted => format!("{} {}", "✓ admit ".green().bold(), url),
        Admission::Rejected(kind) => format!(
            "{} {} {}",
            "✗ reject".red().bold(),
            url,
            format!("({})", kind.as_str()).dimmed()
        ),
    }
}

pub fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

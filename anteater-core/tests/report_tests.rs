// Tests for report generation

use anteater_core::report::{
    ReportFormat, ReportOptions, generate_json_report, generate_report, render_report,
    write_report,
};
use anteater_core::stats::{CrawlStatistics, StatsAccumulator, tokenize};
use tempfile::TempDir;

fn sample_statistics() -> CrawlStatistics {
    let acc = StatsAccumulator::new("ics.uci.edu");
    acc.record_page(
        "http://vision.ics.uci.edu/",
        &tokenize("vision vision graphics and the lab"),
    );
    acc.record_page(
        "http://www.ics.uci.edu/about/",
        &tokenize("about the school graphics research research research"),
    );
    acc.record_page("http://www.cs.uci.edu/", &tokenize("research"));
    acc.snapshot()
}

// ============================================================================
// Text Report
// ============================================================================

#[test]
fn test_report_has_four_numbered_sections() {
    let report = generate_report(&sample_statistics(), &ReportOptions::default());
    let first = report.find("1. Unique pages").unwrap();
    let second = report.find("2. Longest page").unwrap();
    let third = report.find("3. Top 50 words").unwrap();
    let fourth = report.find("4. Subdomains of ics.uci.edu (2)").unwrap();
    assert!(first < second && second < third && third < fourth);
}

#[test]
fn test_report_contents() {
    let report = generate_report(&sample_statistics(), &ReportOptions::default());
    assert!(report.contains("   3\n"));
    assert!(report.contains("http://www.ics.uci.edu/about/ (7 words)"));
    assert!(report.contains("   vision.ics.uci.edu, 1\n"));
    assert!(report.contains("   www.ics.uci.edu, 1\n"));
    assert!(!report.contains("www.cs.uci.edu,"));
}

#[test]
fn test_report_word_order() {
    let report = generate_report(&sample_statistics(), &ReportOptions::default());
    let research = report.find(" research ").unwrap();
    let graphics = report.find(" graphics ").unwrap();
    let vision = report.find(" vision ").unwrap();
    let lab = report.find(" lab ").unwrap();
    // 4, then 2 and 2 alphabetically, then 1.
    assert!(research < graphics && graphics < vision && vision < lab);
    assert!(!report.contains(" the "));
    assert!(!report.contains(" about "));
}

#[test]
fn test_report_top_n_limit() {
    let options = ReportOptions {
        top_n: 1,
        ..ReportOptions::default()
    };
    let report = generate_report(&sample_statistics(), &options);
    assert!(report.contains("3. Top 1 words"));
    assert!(report.contains("research"));
    assert!(!report.contains(" graphics "));
}

// ============================================================================
// JSON Report
// ============================================================================

#[test]
fn test_json_report_fields() {
    let json = generate_json_report(&sample_statistics(), &ReportOptions::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["unique_pages"], 3);
    assert_eq!(value["longest_page"]["words"], 7);
    assert_eq!(value["top_words"][0]["word"], "research");
    assert_eq!(value["top_words"][0]["count"], 4);
    assert_eq!(value["subdomains"].as_array().unwrap().len(), 2);
}

#[test]
fn test_render_report_dispatch() {
    let stats = sample_statistics();
    let options = ReportOptions::default();
    let text = render_report(&stats, &options, ReportFormat::Text).unwrap();
    assert!(text.contains("1. Unique pages"));
    let json = render_report(&stats, &options, ReportFormat::Json).unwrap();
    assert!(json.trim_start().starts_with('{'));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_write_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.txt");
    let report = generate_report(&sample_statistics(), &ReportOptions::default());
    write_report(&report, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), report);
}

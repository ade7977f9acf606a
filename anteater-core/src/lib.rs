pub mod config;
pub mod crawl;
pub mod error;
pub mod policy;
pub mod processor;
pub mod report;
pub mod stats;
pub mod stopwords;

pub use config::CrawlerConfig;
pub use crawl::{CrawlOptions, CrawlProgress, CrawlProgressCallback, CrawlSummary, Crawler, execute_crawl};
pub use error::CoreError;
pub use policy::{Admission, AdmissionPolicy, AdmissionRule, RuleKind};
pub use processor::{PageOutcome, PageProcessor};
pub use report::{ReportFormat, ReportOptions, generate_report, write_report};
pub use stats::{CrawlStatistics, StatsAccumulator};

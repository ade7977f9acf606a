// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    CrawlOverrides, check_urls, load_config, load_statistics, load_urls_from_file,
    load_urls_from_source, parse_url_line,
};

// Re-export crawl functionality from anteater-core
pub use anteater_core::crawl::{CrawlOptions, CrawlProgressCallback, CrawlSummary, execute_crawl};

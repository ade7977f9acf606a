// Per-page entry point: content checks, duplicate detection, statistics
// and link extraction.

use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::stats::{StatsAccumulator, tokenize};
use anteater_scanner::normalize::normalize_against;
use anteater_scanner::{DedupOutcome, DuplicateIndex, Fingerprint, PageResponse, ScanError, parse_html};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// What happened to one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// No response, a non-200 status, or no body.
    NoContent,
    /// Visible text at or below the minimum length.
    TooShort { chars: usize },
    /// Near-duplicate of a page already accepted.
    Duplicate { distance: u32 },
    /// New content; carries every normalized outbound link.
    Accepted { links: Vec<String> },
}

impl PageOutcome {
    pub fn into_links(self) -> Vec<String> {
        match self {
            PageOutcome::Accepted { links } => links,
            _ => Vec::new(),
        }
    }
}

pub struct PageProcessor {
    index: Mutex<DuplicateIndex>,
    stats: Arc<StatsAccumulator>,
    min_text_chars: usize,
}

impl PageProcessor {
    pub fn new(stats: Arc<StatsAccumulator>) -> Self {
        Self {
            index: Mutex::new(DuplicateIndex::new()),
            stats,
            min_text_chars: crate::config::DEFAULT_MIN_TEXT_CHARS,
        }
    }

    pub fn from_config(config: &CrawlerConfig, stats: Arc<StatsAccumulator>) -> Result<Self> {
        let index = DuplicateIndex::with_tolerance(config.dedup.max_distance, config.dedup.blocks)?;
        Ok(Self::new(stats)
            .with_index(index)
            .with_min_text_chars(config.processor.min_text_chars))
    }

    pub fn with_index(mut self, index: DuplicateIndex) -> Self {
        self.index = Mutex::new(index);
        self
    }

    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars;
        self
    }

    pub fn stats(&self) -> &Arc<StatsAccumulator> {
        &self.stats
    }

    pub fn indexed_pages(&self) -> usize {
        self.index.lock().len()
    }

    /// Candidate links from one fetched page, unfiltered by admission
    /// policy. Empty when the page carries nothing new.
    pub fn process_page(&self, requested_url: &str, response: Option<&PageResponse>) -> Vec<String> {
        self.process(requested_url, response).into_links()
    }

    /// Like [`process_page`](Self::process_page) but says why a page
    /// produced no links. Internal failures are logged and reported as
    /// `NoContent` so one bad page never stops a crawl.
    pub fn process(&self, requested_url: &str, response: Option<&PageResponse>) -> PageOutcome {
        match self.try_process(requested_url, response) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to process {}: {}", requested_url, e);
                PageOutcome::NoContent
            }
        }
    }

    fn try_process(&self, requested_url: &str, response: Option<&PageResponse>) -> Result<PageOutcome> {
        let Some(response) = response.filter(|r| r.is_ok()) else {
            return Ok(PageOutcome::NoContent);
        };
        let Some(html) = response.body_text() else {
            return Ok(PageOutcome::NoContent);
        };

        let page = parse_html(&html);
        let chars = page.text.chars().count();
        if chars <= self.min_text_chars {
            debug!(url = requested_url, chars, "page below text threshold");
            return Ok(PageOutcome::TooShort { chars });
        }

        let base = Url::parse(&response.final_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", response.final_url, e)))?;

        let fingerprint = Fingerprint::compute(&page.text);
        let outcome = self.index.lock().check_and_insert(fingerprint);
        if let DedupOutcome::Duplicate { distance, .. } = outcome {
            debug!(url = requested_url, distance, "near-duplicate page skipped");
            return Ok(PageOutcome::Duplicate { distance });
        }

        let words = tokenize(&page.text);
        self.stats.record_page(requested_url, &words);
        self.stats.checkpoint_if_due();

        let links: Vec<String> = page
            .hrefs
            .iter()
            .filter_map(|href| normalize_against(&base, href.as_deref()?))
            .collect();

        debug!(
            url = requested_url,
            words = words.len(),
            links = links.len(),
            "page accepted"
        );
        Ok(PageOutcome::Accepted { links })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> PageProcessor {
        PageProcessor::new(Arc::new(StatsAccumulator::new("ics.uci.edu")))
    }

    fn html_page(text: &str) -> String {
        format!("<html><body><p>{}</p><a href=\"/next\">next</a></body></html>", text)
    }

    fn prose(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_absent_response() {
        assert!(processor().process_page("http://a.ics.uci.edu/", None).is_empty());
    }

    #[test]
    fn test_non_200_and_missing_body() {
        let p = processor();
        let not_found = PageResponse::new("http://a.ics.uci.edu/".to_string(), 404)
            .with_body(html_page(&prose(200)));
        assert_eq!(p.process("http://a.ics.uci.edu/", Some(&not_found)), PageOutcome::NoContent);

        let empty = PageResponse::new("http://a.ics.uci.edu/".to_string(), 200);
        assert_eq!(p.process("http://a.ics.uci.edu/", Some(&empty)), PageOutcome::NoContent);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let p = processor().with_min_text_chars(10);
        // Anchor text counts as visible text.
        let response = PageResponse::new("http://a.ics.uci.edu/".to_string(), 200)
            .with_body("<p>abcde</p><a href=\"/x\">f</a>");
        assert!(matches!(
            p.process("http://a.ics.uci.edu/", Some(&response)),
            PageOutcome::TooShort { .. }
        ));
    }

    #[test]
    fn test_unparsable_final_url_yields_nothing() {
        let p = processor();
        let response = PageResponse::new("not a url".to_string(), 200).with_body(html_page(&prose(200)));
        assert!(p.process_page("http://a.ics.uci.edu/", Some(&response)).is_empty());
        assert_eq!(p.stats().unique_page_count(), 0);
    }

    #[test]
    fn test_accepted_page_records_stats() {
        let p = processor();
        let response = PageResponse::new("http://a.ics.uci.edu/".to_string(), 200)
            .with_body(html_page(&prose(200)));
        let links = p.process_page("http://a.ics.uci.edu/", Some(&response));
        assert_eq!(links, vec!["http://a.ics.uci.edu/next".to_string()]);
        assert_eq!(p.indexed_pages(), 1);

        let stats = p.stats().snapshot();
        assert_eq!(stats.unique_page_count(), 1);
        assert_eq!(stats.domain_list.get("a.ics.uci.edu"), Some(&1));
    }
}

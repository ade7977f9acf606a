use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::policy::AdmissionPolicy;
use crate::processor::{PageOutcome, PageProcessor};
use crate::stats::{CrawlStatistics, StatsAccumulator};
use anteater_scanner::Fetcher;
use anteater_scanner::normalize::normalize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    pub config: CrawlerConfig,
    pub show_progress_bars: bool,
}

/// Running totals passed to progress callbacks after every page.
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    pub worker_id: usize,
    pub url: String,
    pub fetched: usize,
    pub queued: usize,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(&CrawlProgress) + Send + Sync>;

/// What a crawl did, summed over all workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub fetched: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub too_short: usize,
    pub no_content: usize,
    pub links_admitted: usize,
    pub interrupted: bool,
    /// In-memory statistics at the end of the crawl, whether or not the
    /// final snapshot write succeeded.
    pub statistics: CrawlStatistics,
}

impl CrawlSummary {
    fn record(&mut self, outcome: &PageOutcome) {
        self.fetched += 1;
        match outcome {
            PageOutcome::NoContent => self.no_content += 1,
            PageOutcome::TooShort { .. } => self.too_short += 1,
            PageOutcome::Duplicate { .. } => self.duplicates += 1,
            PageOutcome::Accepted { .. } => self.accepted += 1,
        }
    }

    fn merge(&mut self, other: &CrawlSummary) {
        self.fetched += other.fetched;
        self.accepted += other.accepted;
        self.duplicates += other.duplicates;
        self.too_short += other.too_short;
        self.no_content += other.no_content;
        self.links_admitted += other.links_admitted;
    }
}

enum Next {
    Url(String),
    Wait,
    Done,
}

// FIFO queue plus every URL ever queued, so each is fetched once.
struct Frontier {
    queue: VecDeque<String>,
    seen: HashSet<String>,
    in_flight: usize,
    dispatched: usize,
    max_pages: usize,
}

impl Frontier {
    fn new(max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            in_flight: 0,
            dispatched: 0,
            max_pages,
        }
    }

    fn push(&mut self, url: String) -> bool {
        if self.seen.insert(url.clone()) {
            self.queue.push_back(url);
            true
        } else {
            false
        }
    }

    fn next(&mut self) -> Next {
        if self.max_pages > 0 && self.dispatched >= self.max_pages {
            return Next::Done;
        }
        match self.queue.pop_front() {
            Some(url) => {
                self.dispatched += 1;
                self.in_flight += 1;
                Next::Url(url)
            }
            // Another worker may still add links.
            None if self.in_flight > 0 => Next::Wait,
            None => Next::Done,
        }
    }

    fn complete(&mut self, links: Vec<String>) -> usize {
        self.in_flight = self.in_flight.saturating_sub(1);
        let mut queued = 0;
        for link in links {
            if self.push(link) {
                queued += 1;
            }
        }
        queued
    }
}

/// Fetch loop around the policy layer: fetch, process, admit, enqueue.
pub struct Crawler {
    fetcher: Fetcher,
    policy: Arc<AdmissionPolicy>,
    processor: Arc<PageProcessor>,
    workers: usize,
    max_pages: usize,
    politeness_delay: Duration,
    progress_callback: Option<CrawlProgressCallback>,
}

impl Crawler {
    /// Build every component from configuration, resuming statistics from
    /// the configured state file when it exists.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        config.validate()?;
        let stats = Arc::new(StatsAccumulator::from_config(&config.stats));
        Ok(Self {
            fetcher: Fetcher::with_options(&config.fetch.user_agent, config.fetch.timeout_secs)?,
            policy: Arc::new(AdmissionPolicy::new(&config.policy)?),
            processor: Arc::new(PageProcessor::from_config(config, stats)?),
            workers: config.fetch.workers.max(1),
            max_pages: config.fetch.max_pages,
            politeness_delay: Duration::from_millis(config.fetch.politeness_delay_ms),
            progress_callback: None,
        })
    }

    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_progress_callback(mut self, callback: CrawlProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn stats(&self) -> Arc<StatsAccumulator> {
        self.processor.stats().clone()
    }

    /// Crawl from `seeds` until the frontier drains, `max_pages` is hit or
    /// Ctrl-C arrives. Statistics are persisted before returning.
    pub async fn run(&self, seeds: &[String]) -> Result<CrawlSummary> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let summary = self.run_until(seeds, shutdown.clone()).await;

        let stats = self.processor.stats();
        if let Err(e) = stats.persist() {
            warn!("Failed to persist crawl statistics: {}", e);
        }

        let mut summary = summary?;
        summary.interrupted = shutdown.load(Ordering::Relaxed);
        summary.statistics = stats.snapshot();
        info!(
            fetched = summary.fetched,
            accepted = summary.accepted,
            duplicates = summary.duplicates,
            unique_pages = stats.unique_page_count(),
            "crawl finished"
        );
        Ok(summary)
    }

    async fn run_until(&self, seeds: &[String], shutdown: Arc<AtomicBool>) -> Result<CrawlSummary> {
        let mut frontier = Frontier::new(self.max_pages);
        for seed in seeds {
            match normalize(seed, Some(seed.as_str())) {
                Some(url) => {
                    frontier.push(url);
                }
                None => warn!("Skipping invalid seed URL: {}", seed),
            }
        }
        info!(
            "Starting crawl of {} seeds with {} workers",
            frontier.queue.len(),
            self.workers
        );
        let frontier = Arc::new(Mutex::new(frontier));

        let handles: Vec<_> = (0..self.workers)
            .map(|worker_id| {
                let worker = Worker {
                    id: worker_id,
                    fetcher: self.fetcher.clone(),
                    policy: self.policy.clone(),
                    processor: self.processor.clone(),
                    frontier: frontier.clone(),
                    shutdown: shutdown.clone(),
                    politeness_delay: self.politeness_delay,
                    progress_callback: self.progress_callback.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        let all_workers = join_all(handles);
        tokio::pin!(all_workers);
        let results = tokio::select! {
            results = &mut all_workers => results,
            Ok(()) = tokio::signal::ctrl_c() => {
                info!("Interrupted, finishing in-flight pages");
                shutdown.store(true, Ordering::Relaxed);
                all_workers.await
            }
        };

        let mut summary = CrawlSummary::default();
        for result in results {
            summary.merge(&result?);
        }
        Ok(summary)
    }
}

struct Worker {
    id: usize,
    fetcher: Fetcher,
    policy: Arc<AdmissionPolicy>,
    processor: Arc<PageProcessor>,
    frontier: Arc<Mutex<Frontier>>,
    shutdown: Arc<AtomicBool>,
    politeness_delay: Duration,
    progress_callback: Option<CrawlProgressCallback>,
}

impl Worker {
    async fn run(self) -> CrawlSummary {
        debug!("Worker {} started", self.id);
        let mut tally = CrawlSummary::default();

        while !self.shutdown.load(Ordering::Relaxed) {
            let next = self.frontier.lock().await.next();
            let url = match next {
                Next::Url(url) => url,
                Next::Wait => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
                Next::Done => break,
            };

            let response = self.fetcher.fetch_or_none(&url).await;
            let outcome = self.processor.process(&url, response.as_ref());
            tally.record(&outcome);

            let admitted = self.policy.filter(outcome.into_links());
            let (queued, fetched) = {
                let mut frontier = self.frontier.lock().await;
                let queued = frontier.complete(admitted);
                (queued, frontier.dispatched)
            };
            tally.links_admitted += queued;
            debug!("[Worker {}] {} queued {} new links", self.id, url, queued);

            if let Some(ref callback) = self.progress_callback {
                callback(&CrawlProgress {
                    worker_id: self.id,
                    url,
                    fetched,
                    queued,
                });
            }

            if !self.politeness_delay.is_zero() {
                tokio::time::sleep(self.politeness_delay).await;
            }
        }

        debug!("Worker {} finished", self.id);
        tally
    }
}

/// Execute a crawl with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    let CrawlOptions {
        seeds,
        config,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(Arc::new(pb))
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let callback: CrawlProgressCallback = Arc::new(move |progress: &CrawlProgress| {
        if let Some(ref pb) = pb_clone {
            pb.set_message(format!(
                "Crawling... {} pages fetched, last {}",
                progress.fetched, progress.url
            ));
        }
        if let Some(ref cb) = progress_callback {
            cb(progress);
        }
    });

    let crawler = Crawler::from_config(&config)?.with_progress_callback(callback);
    let summary = crawler.run(&seeds).await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }
    summary
}

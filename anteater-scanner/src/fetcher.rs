use crate::error::Result;
use crate::result::PageResponse;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_USER_AGENT: &str = "Anteater/0.2 (focused research crawler)";

/// Thin HTTP client turning a URL into a [`PageResponse`].
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_USER_AGENT, 10)
    }

    pub fn with_options(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch `url`. Non-200 statuses still produce a response; only
    /// transport failures are errors.
    pub async fn fetch(&self, url: &str) -> Result<PageResponse> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!(
            url,
            final_url = final_url.as_str(),
            status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(PageResponse::new(final_url, status).with_body(body.to_vec()))
    }

    /// Fetch `url`, logging transport failures and returning `None` for
    /// them so a dead link is just a page without content.
    pub async fn fetch_or_none(&self, url: &str) -> Option<PageResponse> {
        match self.fetch(url).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Fetch error for {}: {}", url, e);
                None
            }
        }
    }
}

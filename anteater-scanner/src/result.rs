use serde::{Deserialize, Serialize};

/// What the fetcher hands over for one requested URL.
///
/// `final_url` is the URL after redirects; links on the page resolve
/// against it rather than against the requested URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub final_url: String,
    pub status: u16,
    pub body: Option<Vec<u8>>,
}

impl PageResponse {
    pub fn new(final_url: String, status: u16) -> Self {
        Self {
            final_url,
            status,
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid index layout: {0}")]
    IndexLayout(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

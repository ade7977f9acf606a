pub mod dedup;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod fingerprint;
pub mod normalize;
pub mod result;

pub use dedup::{DedupOutcome, DuplicateIndex};
pub use error::ScanError;
pub use extract::{ParsedPage, parse_html};
pub use fetcher::Fetcher;
pub use fingerprint::Fingerprint;
pub use normalize::normalize;
pub use result::PageResponse;

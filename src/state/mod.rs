//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: Tracks where a URL is in the pipeline (raw, filtered, fetching, done, etc.)
//! - `CrawlCounter`: Counts URLs admitted by the filter chain

mod counter;
mod url_state;

// Re-export main types
pub use counter::CrawlCounter;
pub use url_state::UrlState;

//! URL handling module for hostcrawl
//!
//! This module provides the crawl target, link resolution against a page or
//! the target origin, and authority extraction.

mod domain;
mod normalize;
mod target;

// Re-export main functions
pub use domain::authority;
pub use normalize::{parse_seed, resolve, DEFAULT_SCHEME};
pub use target::CrawlTarget;

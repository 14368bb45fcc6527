//! Crawler module for the crawl pipeline and its parts
//!
//! This module contains the core crawling logic, including:
//! - Link extraction from page bodies
//! - The filter chain deciding which URLs are crawled
//! - Page fetching behind the `Fetcher` trait
//! - The pipeline that wires them into a self-feeding loop

mod extractor;
mod fetcher;
mod filter;
mod pipeline;

pub use extractor::{LinkExtractor, DEFAULT_LINK_PATTERN};
pub use fetcher::{build_http_client, Fetcher, HttpFetcher};
pub use filter::{
    ExcludePattern, FilterChain, FilterPredicate, HostContains, HostEquals, IncludePattern,
    PathPrefix,
};
pub use pipeline::{start_crawl, Pipeline, PipelineSettings, Submitter};

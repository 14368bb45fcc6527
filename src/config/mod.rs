//! Configuration module for hostcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use hostcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Backpressure, Config, CrawlerConfig, FilterConfig, HttpConfig};
pub(crate) use types::{default_queue_capacity, default_workers};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;

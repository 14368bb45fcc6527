//! Output module for crawl observability
//!
//! This module handles:
//! - The events the pipeline emits for each URL
//! - Observers that print, forward, or tally those events
//! - Printing crawl statistics

mod observer;
pub mod stats;

pub use observer::{ChannelObserver, CrawlEvent, CrawlObserver, StdoutObserver};
pub use stats::{print_statistics, CrawlStatistics, CrawlStats};

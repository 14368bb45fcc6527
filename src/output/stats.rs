//! Crawl statistics collected from pipeline events
//!
//! [`CrawlStats`] is an observer that tallies events as they happen, so a
//! summary can be printed when the crawl is shut down.

use crate::output::observer::{CrawlEvent, CrawlObserver};
use crate::state::UrlState;
use std::collections::HashMap;
use std::sync::Mutex;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// URLs admitted by the filter chain
    pub accepted: u64,

    /// URLs dropped by a filter
    pub rejected: u64,

    /// Pages fetched successfully
    pub fetched: u64,

    /// Fetches that failed
    pub failed: u64,

    /// Links resubmitted from fetched pages
    pub links_found: u64,

    /// Rejection counts by filter name
    pub rejections_by_filter: HashMap<String, u64>,
}

impl CrawlStatistics {
    /// Number of URLs that reached the given state
    pub fn count_for(&self, state: UrlState) -> u64 {
        match state {
            UrlState::Filtered => self.accepted,
            UrlState::Rejected => self.rejected,
            UrlState::Done => self.fetched,
            UrlState::FetchFailed => self.failed,
            _ => 0,
        }
    }

    /// Share of finished fetches that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let finished = self.fetched + self.failed;
        if finished > 0 {
            (self.fetched as f64 / finished as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Observer that accumulates [`CrawlStatistics`]
#[derive(Debug, Default)]
pub struct CrawlStats {
    inner: Mutex<CrawlStatistics>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the statistics gathered so far
    pub fn snapshot(&self) -> CrawlStatistics {
        self.inner
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl CrawlObserver for CrawlStats {
    fn on_event(&self, event: &CrawlEvent) {
        let mut stats = match self.inner.lock() {
            Ok(stats) => stats,
            Err(poisoned) => poisoned.into_inner(),
        };

        match event {
            CrawlEvent::Accepted { .. } => stats.accepted += 1,
            CrawlEvent::Rejected { filter, .. } => {
                stats.rejected += 1;
                *stats
                    .rejections_by_filter
                    .entry(filter.clone())
                    .or_insert(0) += 1;
            }
            CrawlEvent::Fetched { links, .. } => {
                stats.fetched += 1;
                stats.links_found += *links as u64;
            }
            CrawlEvent::FetchFailed { .. } => stats.failed += 1,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("URLs by State:");
    for state in [
        UrlState::Filtered,
        UrlState::Rejected,
        UrlState::Done,
        UrlState::FetchFailed,
    ] {
        println!("  {}: {}", state, stats.count_for(state));
    }
    println!("  links found: {}", stats.links_found);
    println!();

    if !stats.rejections_by_filter.is_empty() {
        println!("Rejections by Filter:");
        // Sort filters by count (descending)
        let mut filter_counts: Vec<_> = stats.rejections_by_filter.iter().collect();
        filter_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (filter, count) in filter_counts {
            println!("  {}: {}", filter, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        stats.success_rate(),
        stats.fetched,
        stats.fetched + stats.failed
    );
}

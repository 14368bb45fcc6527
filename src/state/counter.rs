use std::sync::atomic::{AtomicU64, Ordering};

/// Number of URLs admitted by the filter chain
///
/// Shared between the dispatch stage and anyone observing the crawl. The
/// value never decreases.
#[derive(Debug, Default)]
pub struct CrawlCounter {
    count: AtomicU64,
}

impl CrawlCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter and returns the new value
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

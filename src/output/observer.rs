//! Crawl events and the observers that consume them

use crate::state::UrlState;
use std::fmt;
use tokio::sync::mpsc;

/// Something that happened to a URL in the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// The dispatch stage took a filtered URL; `count` is the running total
    Accepted { url: String, count: u64 },

    /// A filter dropped the URL
    Rejected { url: String, filter: String },

    /// The page was fetched and `links` candidates were resubmitted
    Fetched { url: String, links: usize },

    /// The fetch failed and the URL was dropped
    FetchFailed { url: String, error: String },
}

impl CrawlEvent {
    pub fn url(&self) -> &str {
        match self {
            Self::Accepted { url, .. }
            | Self::Rejected { url, .. }
            | Self::Fetched { url, .. }
            | Self::FetchFailed { url, .. } => url,
        }
    }

    /// The state the URL reached when this event was emitted
    pub fn state(&self) -> UrlState {
        match self {
            Self::Accepted { .. } => UrlState::Filtered,
            Self::Rejected { .. } => UrlState::Rejected,
            Self::Fetched { .. } => UrlState::Done,
            Self::FetchFailed { .. } => UrlState::FetchFailed,
        }
    }
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { url, count } => write!(f, "[{}] {}", count, url),
            Self::Rejected { url, filter } => write!(f, "rejected by {}: {}", filter, url),
            Self::Fetched { url, links } => write!(f, "fetched {} ({} links)", url, links),
            Self::FetchFailed { url, error } => write!(f, "failed {}: {}", url, error),
        }
    }
}

/// Receives every event the pipeline emits
///
/// Implementations are called from pipeline tasks and must not block.
pub trait CrawlObserver: Send + Sync {
    fn on_event(&self, event: &CrawlEvent);
}

/// Prints each accepted URL and the running count to stdout
#[derive(Debug, Default)]
pub struct StdoutObserver;

impl CrawlObserver for StdoutObserver {
    fn on_event(&self, event: &CrawlEvent) {
        if let CrawlEvent::Accepted { url, count } = event {
            println!("{}", url);
            println!("{}", count);
        }
    }
}

/// Forwards events into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<CrawlEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiver its events arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CrawlEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl CrawlObserver for ChannelObserver {
    fn on_event(&self, event: &CrawlEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.sender.send(event.clone());
    }
}

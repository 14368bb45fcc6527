use serde::Deserialize;

/// Main configuration structure for hostcrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Ordered filter list; `None` selects the default host-contains chain
    #[serde(default, rename = "filter")]
    pub filters: Option<Vec<FilterConfig>>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    pub seed: String,

    /// Host that scopes the crawl (defaults to the seed's host and port)
    #[serde(default)]
    pub host: Option<String>,

    /// Maximum number of concurrent fetches
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of each pipeline queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// What a producer does when a queue is full
    #[serde(default)]
    pub backpressure: Backpressure,

    /// Custom link extraction regex with exactly one capture group
    #[serde(default)]
    pub link_pattern: Option<String>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Policy applied when a bounded pipeline queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backpressure {
    /// The producer waits until the queue has room
    #[default]
    Block,
    /// The submission fails with `SubmitError::QueueFull`
    Reject,
}

/// One entry of the ordered filter list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterConfig {
    /// URL string contains the target host
    HostContains,
    /// URL authority equals the target host
    HostEquals,
    /// URL matches the regex
    IncludePattern { pattern: String },
    /// URL does not match the regex
    ExcludePattern { pattern: String },
    /// URL path starts with the prefix
    PathPrefix { prefix: String },
}

pub(crate) fn default_workers() -> usize {
    8
}

pub(crate) fn default_queue_capacity() -> usize {
    1024
}

fn default_user_agent() -> String {
    format!("hostcrawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

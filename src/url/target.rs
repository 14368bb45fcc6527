use crate::url::domain::authority;
use crate::url::normalize::parse_seed;
use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// The scope of a crawl
///
/// `host` is what the host filters compare URLs against; `origin`
/// (`scheme://host[:port]/`) is what root-relative links resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    host: String,
    origin: Url,
}

impl CrawlTarget {
    /// Builds a target from a seed URL, scoped to the seed's authority
    pub fn from_seed(seed: &str) -> UrlResult<Self> {
        let url = parse_seed(seed)?;
        let host = authority(&url).ok_or_else(|| UrlError::MissingHost(seed.to_string()))?;
        let origin = Url::parse(&format!("{}://{}/", url.scheme(), host))
            .map_err(|e| UrlError::Malformed(e.to_string()))?;

        Ok(Self { host, origin })
    }

    /// Replaces the scope host while keeping the seed's origin
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.host, self.origin)
    }
}

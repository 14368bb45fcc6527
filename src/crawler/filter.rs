//! Admission filters applied to every URL before it is fetched
//!
//! A [`FilterChain`] is an ordered conjunction of [`FilterPredicate`]s.
//! Evaluation stops at the first predicate that rejects; an empty chain
//! admits everything.

use crate::config::FilterConfig;
use crate::url::{authority, CrawlTarget};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// A single admission rule
pub trait FilterPredicate: Send + Sync {
    /// Returns true if `url` may be crawled
    fn evaluate(&self, url: &str, target: &CrawlTarget) -> bool;

    /// Name used in logs and rejection events
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> FilterPredicate for F
where
    F: Fn(&str, &CrawlTarget) -> bool + Send + Sync,
{
    fn evaluate(&self, url: &str, target: &CrawlTarget) -> bool {
        self(url, target)
    }
}

/// Admits URLs whose text contains the target host anywhere
///
/// This is a substring test, not a host comparison:
/// `http://evil.test/?r=site.test` is admitted for host `site.test`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostContains;

impl FilterPredicate for HostContains {
    fn evaluate(&self, url: &str, target: &CrawlTarget) -> bool {
        url.contains(target.host())
    }

    fn name(&self) -> &str {
        "host-contains"
    }
}

/// Admits URLs whose parsed authority equals the target host
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEquals;

impl FilterPredicate for HostEquals {
    fn evaluate(&self, url: &str, target: &CrawlTarget) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|url| authority(&url))
            .map(|host| host.eq_ignore_ascii_case(target.host()))
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "host-equals"
    }
}

/// Admits URLs matching a regex
#[derive(Debug, Clone)]
pub struct IncludePattern(Regex);

impl IncludePattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        compile(pattern).map(Self)
    }
}

impl FilterPredicate for IncludePattern {
    fn evaluate(&self, url: &str, _target: &CrawlTarget) -> bool {
        self.0.is_match(url)
    }

    fn name(&self) -> &str {
        "include-pattern"
    }
}

/// Rejects URLs matching a regex
#[derive(Debug, Clone)]
pub struct ExcludePattern(Regex);

impl ExcludePattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        compile(pattern).map(Self)
    }
}

impl FilterPredicate for ExcludePattern {
    fn evaluate(&self, url: &str, _target: &CrawlTarget) -> bool {
        !self.0.is_match(url)
    }

    fn name(&self) -> &str {
        "exclude-pattern"
    }
}

/// Admits URLs whose path starts with a prefix
#[derive(Debug, Clone)]
pub struct PathPrefix(String);

impl PathPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl FilterPredicate for PathPrefix {
    fn evaluate(&self, url: &str, _target: &CrawlTarget) -> bool {
        Url::parse(url)
            .map(|url| url.path().starts_with(&self.0))
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "path-prefix"
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

/// Ordered list of predicates, all of which must admit a URL
#[derive(Default)]
pub struct FilterChain {
    predicates: Vec<Box<dyn FilterPredicate>>,
}

impl FilterChain {
    /// Creates an empty chain, which admits every URL
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default chain: a single [`HostContains`]
    pub fn host_contains() -> Self {
        Self::new().with(HostContains)
    }

    /// Builds a chain from the configured filter list
    ///
    /// `None` selects [`FilterChain::host_contains`]; an empty list builds an
    /// empty chain.
    pub fn from_config(filters: Option<&[FilterConfig]>) -> Result<Self, ConfigError> {
        let Some(filters) = filters else {
            return Ok(Self::host_contains());
        };

        let mut chain = Self::new();
        for filter in filters {
            match filter {
                FilterConfig::HostContains => chain.push(HostContains),
                FilterConfig::HostEquals => chain.push(HostEquals),
                FilterConfig::IncludePattern { pattern } => {
                    chain.push(IncludePattern::new(pattern)?)
                }
                FilterConfig::ExcludePattern { pattern } => {
                    chain.push(ExcludePattern::new(pattern)?)
                }
                FilterConfig::PathPrefix { prefix } => chain.push(PathPrefix::new(prefix)),
            }
        }
        Ok(chain)
    }

    /// Appends a predicate; predicates run in the order they were added
    pub fn push(&mut self, predicate: impl FilterPredicate + 'static) {
        self.predicates.push(Box::new(predicate));
    }

    pub fn with(mut self, predicate: impl FilterPredicate + 'static) -> Self {
        self.push(predicate);
        self
    }

    /// Returns true if every predicate admits `url`
    pub fn admit(&self, url: &str, target: &CrawlTarget) -> bool {
        self.first_rejection(url, target).is_none()
    }

    /// Returns the name of the first predicate that rejects `url`, if any
    pub fn first_rejection(&self, url: &str, target: &CrawlTarget) -> Option<&str> {
        self.predicates
            .iter()
            .find(|predicate| !predicate.evaluate(url, target))
            .map(|predicate| predicate.name())
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Names of the registered predicates, in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("predicates", &self.names())
            .finish()
    }
}

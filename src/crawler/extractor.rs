//! Link extraction from raw page content
//!
//! Links are found with a single regular expression rather than an HTML
//! parser. The default pattern only matches anchor tags whose `href` value
//! textually starts with `http`, so root-relative and relative links in the
//! raw markup are not extracted. Nested or malformed markup may be
//! mis-extracted because the match is non-greedy and spans lines.

use crate::ConfigError;
use regex::Regex;

/// Default anchor pattern; capture group 1 is the `href` value
pub const DEFAULT_LINK_PATTERN: &str = r#"(?s)<a[ \t]+.*?href="(http.*?)".*?>.*?</a>"#;

/// Extracts raw candidate links from page bodies
///
/// The extractor holds no per-page state: every call to [`extract`]
/// rescans the body from the start.
///
/// [`extract`]: LinkExtractor::extract
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pattern: Regex,
}

impl LinkExtractor {
    /// Creates an extractor using [`DEFAULT_LINK_PATTERN`]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_LINK_PATTERN).expect("default link pattern is valid"),
        }
    }

    /// Creates an extractor from a custom pattern
    ///
    /// The pattern must contain exactly one capture group, which selects the
    /// link text.
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidPattern` - The regex does not compile or has
    ///   the wrong number of capture groups
    pub fn with_pattern(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() != 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "'{}' must have exactly one capture group, found {}",
                pattern,
                regex.captures_len() - 1
            )));
        }

        Ok(Self { pattern: regex })
    }

    /// Lazily yields every candidate link in `body`, in document order
    ///
    /// # Example
    ///
    /// ```
    /// use hostcrawl::crawler::LinkExtractor;
    ///
    /// let body = r#"<a href="http://a.com/x">x</a> <a href="/y">y</a>"#;
    /// let links: Vec<&str> = LinkExtractor::new().extract(body).collect();
    /// assert_eq!(links, vec!["http://a.com/x"]);
    /// ```
    pub fn extract<'a>(&'a self, body: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern
            .captures_iter(body)
            .filter_map(|captures| captures.get(1))
            .map(|link| link.as_str())
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

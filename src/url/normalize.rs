use crate::url::target::CrawlTarget;
use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Scheme given to protocol-relative links (`//host/path`)
pub const DEFAULT_SCHEME: &str = "http";

/// Resolves a link found on a page into an absolute URL
///
/// # Resolution Rules
///
/// 1. Absolute candidates (with a scheme) are returned unchanged
/// 2. Protocol-relative candidates (`//host/path`) get the `http:` scheme
/// 3. Root-relative candidates (`/path`) resolve against the crawl target's
///    origin, not the page URL
/// 4. Everything else resolves against `base` per RFC 3986 §5, which also
///    removes `.` and `..` segments
///
/// Surrounding whitespace is trimmed before any rule applies.
///
/// # Arguments
///
/// * `base` - URL of the page the link was found on
/// * `candidate` - The raw link text
/// * `target` - The crawl target
///
/// # Returns
///
/// * `Ok(String)` - The absolute URL
/// * `Err(UrlError::Malformed)` - The candidate is not a valid URL reference
///
/// # Examples
///
/// ```
/// use hostcrawl::url::{resolve, CrawlTarget};
/// use url::Url;
///
/// let target = CrawlTarget::from_seed("http://a.com/").unwrap();
/// let base = Url::parse("http://a.com/dir/page.html").unwrap();
///
/// assert_eq!(resolve(&base, "other.html", &target).unwrap(), "http://a.com/dir/other.html");
/// assert_eq!(resolve(&base, "//cdn.a.com/x", &target).unwrap(), "http://cdn.a.com/x");
/// ```
pub fn resolve(base: &Url, candidate: &str, target: &CrawlTarget) -> UrlResult<String> {
    let candidate = candidate.trim();

    match Url::parse(candidate) {
        Ok(_) => return Ok(candidate.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => return Err(UrlError::Malformed(format!("{}: {}", candidate, e))),
    }

    let resolved = if candidate.starts_with("//") {
        Url::parse(&format!("{}:{}", DEFAULT_SCHEME, candidate))
    } else if candidate.starts_with('/') {
        target.origin().join(candidate)
    } else {
        base.join(candidate)
    };

    resolved
        .map(|url| url.to_string())
        .map_err(|e| UrlError::Malformed(format!("{}: {}", candidate, e)))
}

/// Parses a seed URL, requiring an HTTP(S) scheme and a host
///
/// # Examples
///
/// ```
/// use hostcrawl::url::parse_seed;
///
/// assert!(parse_seed("http://site.test/").is_ok());
/// assert!(parse_seed("ftp://site.test/").is_err());
/// ```
pub fn parse_seed(seed: &str) -> UrlResult<Url> {
    let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(seed.to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> CrawlTarget {
        CrawlTarget::from_seed("http://site.test/").unwrap()
    }

    fn page() -> Url {
        Url::parse("http://a.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_absolute_returned_unchanged() {
        for candidate in [
            "http://a.com/x",
            "https://other.test/a/../b?q=1#frag",
            "http://a.com",
            "mailto:someone@a.com",
        ] {
            assert_eq!(resolve(&page(), candidate, &target()).unwrap(), candidate);
        }
    }

    #[test]
    fn test_protocol_relative_gets_http() {
        let result = resolve(&page(), "//example.com/x", &target()).unwrap();
        assert_eq!(result, "http://example.com/x");
    }

    #[test]
    fn test_protocol_relative_ignores_https_base() {
        let base = Url::parse("https://secure.test/page").unwrap();
        let result = resolve(&base, "//example.com/x", &target()).unwrap();
        assert_eq!(result, "http://example.com/x");
    }

    #[test]
    fn test_root_relative_uses_target_origin() {
        for base in [
            "http://a.com/dir/page.html",
            "https://elsewhere.test/deep/path/",
            "http://site.test/blog/post",
        ] {
            let base = Url::parse(base).unwrap();
            assert_eq!(
                resolve(&base, "/path", &target()).unwrap(),
                "http://site.test/path"
            );
        }
    }

    #[test]
    fn test_root_relative_keeps_target_port() {
        let target = CrawlTarget::from_seed("http://127.0.0.1:8080/start").unwrap();
        let result = resolve(&page(), "/about?x=1", &target).unwrap();
        assert_eq!(result, "http://127.0.0.1:8080/about?x=1");
    }

    #[test]
    fn test_relative_against_page() {
        let result = resolve(&page(), "other.html", &target()).unwrap();
        assert_eq!(result, "http://a.com/dir/other.html");
    }

    #[test]
    fn test_relative_dot_segments() {
        assert_eq!(
            resolve(&page(), "../up.html", &target()).unwrap(),
            "http://a.com/up.html"
        );
        assert_eq!(
            resolve(&page(), "./same.html", &target()).unwrap(),
            "http://a.com/dir/same.html"
        );
        assert_eq!(
            resolve(&page(), "../../../../top", &target()).unwrap(),
            "http://a.com/top"
        );
    }

    #[test]
    fn test_query_and_fragment_only() {
        assert_eq!(
            resolve(&page(), "?page=2", &target()).unwrap(),
            "http://a.com/dir/page.html?page=2"
        );
        assert_eq!(
            resolve(&page(), "#top", &target()).unwrap(),
            "http://a.com/dir/page.html#top"
        );
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(
            resolve(&page(), "  http://a.com/x \n", &target()).unwrap(),
            "http://a.com/x"
        );
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(
            resolve(&page(), "http://[bad", &target()),
            Err(UrlError::Malformed(_))
        ));
        assert!(matches!(
            resolve(&page(), "//[bad", &target()),
            Err(UrlError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_seed() {
        assert!(parse_seed("https://site.test/").is_ok());
        assert!(matches!(
            parse_seed("ftp://site.test/"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(parse_seed("not a url"), Err(UrlError::Parse(_))));
    }
}

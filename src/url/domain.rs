use url::Url;

/// Extracts the authority (host plus non-default port) from a URL
///
/// The host is lowercased. Default ports are omitted because the `url`
/// crate drops them while parsing.
///
/// # Arguments
///
/// * `url` - The URL to extract the authority from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host, with `:port` when one is set
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use hostcrawl::url::authority;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

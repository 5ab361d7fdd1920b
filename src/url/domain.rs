use url::Url;

/// Extracts the crawl domain of a URL
///
/// The domain is the lowercase host, followed by `:port` when the URL
/// carries a non-default port. Two URLs belong to the same site only when
/// their domains are equal, so `example.com` and `example.com:8080` differ.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns true when `url` lives on `domain`
pub fn same_domain(url: &Url, domain: &str) -> bool {
    extract_domain(url).is_some_and(|d| d == domain)
}

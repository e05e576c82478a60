use url::Url;

/// Extracts the lower-cased host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use linkwell::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `host` belongs to the site served at `site_host`
///
/// A host is internal when it equals the site host or is one of its
/// subdomains. A leading `www.` is ignored on both sides.
///
/// # Examples
///
/// ```
/// use linkwell::url::is_internal;
///
/// assert!(is_internal("blog.example.com", "example.com"));
/// assert!(is_internal("example.com", "www.example.com"));
/// assert!(!is_internal("notexample.com", "example.com"));
/// ```
pub fn is_internal(host: &str, site_host: &str) -> bool {
    let host = strip_www(host);
    let site = strip_www(site_host);

    if host.eq_ignore_ascii_case(site) {
        return true;
    }

    host.len() > site.len()
        && host.as_bytes()[host.len() - site.len() - 1] == b'.'
        && host
            .get(host.len() - site.len()..)
            .map_or(false, |tail| tail.eq_ignore_ascii_case(site))
}

fn strip_www(host: &str) -> &str {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &host[4..],
        _ => host,
    }
}

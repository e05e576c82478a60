use crate::{UrlError, UrlResult};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// Reason a candidate href was left out of the result set
///
/// Rejections are ordinary outcomes of normalization, not errors; only
/// `Malformed` is reported back to the caller as a parse warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty or whitespace-only href
    Empty,
    /// In-page anchor pointing back at the base document
    FragmentOnly,
    /// Resolved to a scheme other than http/https (mailto:, javascript:, ...)
    UnsupportedScheme(String),
    /// Resolved URL has no host
    MissingHost,
    /// Could not be resolved against the base URL
    Malformed(String),
}

impl Rejection {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty href"),
            Self::FragmentOnly => f.write_str("fragment-only link"),
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported scheme '{}'", scheme),
            Self::MissingHost => f.write_str("missing host"),
            Self::Malformed(reason) => write!(f, "malformed URL: {}", reason),
        }
    }
}

/// Canonical form of an absolute http(s) URL
///
/// Scheme and host are lower-cased, default ports removed and the fragment
/// stripped; path and query are kept as written. Two links point at the
/// same resource exactly when their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Host of the URL, always present for a normalized URL
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Resolves a candidate href against a base URL and canonicalizes it
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject if empty
/// 2. Resolve against `base_url` (absolute, scheme-relative `//host/path`,
///    path-relative and fragment-only references)
/// 3. Reject non-http(s) schemes and URLs without a host
/// 4. Reject pure in-page anchors that resolve back to the base document
/// 5. Lower-case scheme and host, drop default ports (80/443)
/// 6. Remove the fragment
///
/// Path and query are left case-sensitive and otherwise unmodified.
///
/// # Examples
///
/// ```
/// use linkwell::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/page").unwrap();
/// let url = normalize("../About?x=1#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About?x=1");
/// ```
pub fn normalize(candidate_href: &str, base_url: &Url) -> Result<NormalizedUrl, Rejection> {
    let href = candidate_href.trim();
    if href.is_empty() {
        return Err(Rejection::Empty);
    }

    let mut url = base_url
        .join(href)
        .map_err(|e| Rejection::Malformed(format!("'{}': {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Rejection::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(Rejection::MissingHost);
    }

    if url.fragment().is_some() && same_document(&url, base_url) {
        return Err(Rejection::FragmentOnly);
    }

    // The url crate already lower-cases scheme and host and drops default
    // ports while parsing; the fragment is all that is left to remove.
    url.set_fragment(None);

    Ok(NormalizedUrl(url))
}

/// Returns true if both URLs address the same document, ignoring fragments
fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

/// Validates a caller-supplied target URL before any network activity
///
/// The target must be an absolute http or https URL with a host.
///
/// # Examples
///
/// ```
/// use linkwell::url::validate_target;
///
/// assert!(validate_target("https://example.com/page").is_ok());
/// assert!(validate_target("not-a-url").is_err());
/// assert!(validate_target("ftp://example.com/").is_err());
/// ```
pub fn validate_target(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

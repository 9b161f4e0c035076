use crate::UrlError;
use url::Url;

/// Controls how raw link strings are folded before they become addresses
///
/// Addresses are compared as plain strings, so anything not folded here is a
/// distinct key for both the visited registry and the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizePolicy {
    /// Drop everything after `#`
    pub strip_fragments: bool,
}

/// Parses a URL string into its canonical serialized form
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Parse the URL; reject if malformed
/// 3. Reject any scheme other than `http` / `https`
/// 4. Optionally remove the fragment
///
/// Parsing already lowercases the scheme and host and turns an empty path
/// into `/`. Trailing slashes, query strings and (by default) fragments are
/// left untouched.
///
/// # Examples
///
/// ```
/// use burrow::url::{normalize_url, NormalizePolicy};
///
/// let url = normalize_url("HTTP://Example.ONION", NormalizePolicy::default()).unwrap();
/// assert_eq!(url.as_str(), "http://example.onion/");
/// ```
pub fn normalize_url(url_str: &str, policy: NormalizePolicy) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if policy.strip_fragments {
        url.set_fragment(None);
    }

    Ok(url)
}

//! URL normalization for visited-set deduplication
//!
//! The recursive strategy keys its visited set on the normalized form so
//! that `http://WWW.X.test/a/` and `https://x.test/a#top` count as the same
//! page and are never fetched twice. Normalization is only ever applied to
//! the dedup key; the URL that is actually fetched is left untouched.

use crate::UrlError;
use url::Url;

/// Query parameters that never change page identity
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
];

/// Normalizes a URL into its visited-set key
///
/// Steps: parse (reject non-HTTP schemes), fold `http` into `https`,
/// lowercase the host and strip a `www.` prefix, collapse dot segments and
/// duplicate slashes, drop the trailing slash (except for the root path),
/// strip the fragment, drop tracking query parameters, and sort whatever
/// query parameters remain.
///
/// # Examples
///
/// ```
/// use seine::url::normalize_url;
///
/// let key = normalize_url("http://WWW.Example.COM/docs/?utm_source=x#intro").unwrap();
/// assert_eq!(key, "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "https" => {}
        "http" => {
            // Scheme never distinguishes pages for dedup purposes.
            let _ = url.set_scheme("https");
        }
        other => {
            return Err(UrlError::InvalidScheme(format!(
                "only HTTP and HTTPS URLs are crawlable, got: {}",
                other
            )));
        }
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url.to_string())
}

/// Collapses dot segments and duplicate slashes, drops the trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

//! URL classification predicates and the GitHub raw-content rewrite
//!
//! All functions here fail soft: a URL that cannot be parsed returns the
//! conservative default (not a sitemap, not a text file, not binary, left
//! unchanged) rather than an error, so a single odd link never aborts a
//! crawl.

use url::Url;

/// File extensions that identify non-crawlable binary content
///
/// Used to prune the recursive strategy's link-following frontier. Matching
/// is case-insensitive on the path extension with query and fragment
/// stripped.
const BINARY_EXTENSIONS: &[&str] = &[
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar",
    // Executables and libraries
    "exe", "msi", "dmg", "pkg", "deb", "rpm", "apk", "bin", "dll", "so",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt",
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "svg", "tiff",
    // Audio
    "mp3", "wav", "ogg", "flac", "m4a",
    // Video
    "mp4", "avi", "mov", "mkv", "webm", "wmv",
];

/// Returns true if the URL points at an XML sitemap
///
/// A URL is a sitemap when its path ends in `sitemap.xml` or contains
/// `sitemap` anywhere.
pub fn is_sitemap_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path();
            path.ends_with("sitemap.xml") || path.contains("sitemap")
        }
        Err(_) => false,
    }
}

/// Returns true if the URL path ends in `.txt`
pub fn is_text_file_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().ends_with(".txt"),
        Err(_) => false,
    }
}

/// Returns true if the URL path has a known binary file extension
///
/// The check is case-insensitive and unaffected by query strings or
/// fragments: `FILE.ZIP?x=1` classifies the same as `file.zip`.
pub fn is_binary_file_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(p) => p,
        Err(_) => return false,
    };

    // Url::path() already excludes query and fragment.
    let path = parsed.path();
    let extension = match path.rsplit('/').next().and_then(|name| {
        name.rsplit_once('.').map(|(_, ext)| ext)
    }) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return false,
    };

    BINARY_EXTENSIONS.contains(&extension.as_str())
}

/// Rewrites a GitHub blob URL to its raw-content equivalent
///
/// `https://github.com/{owner}/{repo}/blob/{branch}/{path}` becomes
/// `https://raw.githubusercontent.com/{owner}/{repo}/{branch}/{path}`.
/// Directory (`/tree/`) URLs have no raw equivalent and are returned
/// unchanged with a logged warning. Already-raw and non-GitHub URLs pass
/// through untouched, so the transform is idempotent.
///
/// # Examples
///
/// ```
/// use seine::url::transform_github_url;
///
/// let raw = transform_github_url("https://github.com/rust-lang/rust/blob/master/README.md");
/// assert_eq!(raw, "https://raw.githubusercontent.com/rust-lang/rust/master/README.md");
/// assert_eq!(transform_github_url(&raw), raw);
/// ```
pub fn transform_github_url(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(p) => p,
        Err(_) => return url.to_string(),
    };

    if parsed.host_str() != Some("github.com") {
        return url.to_string();
    }

    let segments: Vec<&str> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // Expect {owner}/{repo}/blob/{branch}/{path...}
    match segments.as_slice() {
        [owner, repo, kind, branch, rest @ ..] if !rest.is_empty() => match *kind {
            "blob" => format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}",
                owner,
                repo,
                branch,
                rest.join("/")
            ),
            "tree" => {
                tracing::warn!(
                    "GitHub directory URL has no raw-content equivalent, leaving unchanged: {}",
                    url
                );
                url.to_string()
            }
            _ => url.to_string(),
        },
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_xml_suffix() {
        assert!(is_sitemap_url("https://example.com/sitemap.xml"));
    }

    #[test]
    fn test_sitemap_in_path() {
        assert!(is_sitemap_url("https://example.com/sitemaps/news.xml"));
        assert!(is_sitemap_url("https://example.com/sitemap_index.xml"));
    }

    #[test]
    fn test_not_sitemap() {
        assert!(!is_sitemap_url("https://example.com/site/map.html"));
    }

    #[test]
    fn test_sitemap_malformed_url() {
        assert!(!is_sitemap_url("::not-a-url::"));
    }

    #[test]
    fn test_text_file() {
        assert!(is_text_file_url("https://example.com/readme.txt"));
        assert!(!is_text_file_url("https://example.com/readme.md"));
    }

    #[test]
    fn test_binary_common_extensions() {
        assert!(is_binary_file_url("https://example.com/release.zip"));
        assert!(is_binary_file_url("https://example.com/paper.pdf"));
        assert!(is_binary_file_url("https://example.com/logo.png"));
        assert!(is_binary_file_url("https://example.com/talk.mp4"));
    }

    #[test]
    fn test_binary_case_insensitive() {
        assert!(is_binary_file_url("https://example.com/FILE.ZIP"));
        assert!(is_binary_file_url("https://example.com/Image.PnG"));
    }

    #[test]
    fn test_binary_ignores_query_and_fragment() {
        assert!(is_binary_file_url("https://example.com/FILE.ZIP?x=1"));
        assert!(is_binary_file_url("https://example.com/file.zip#section"));
    }

    #[test]
    fn test_not_binary() {
        assert!(!is_binary_file_url("https://example.com/page.html"));
        assert!(!is_binary_file_url("https://example.com/docs/intro"));
        assert!(!is_binary_file_url("https://example.com/"));
    }

    #[test]
    fn test_binary_malformed_url() {
        assert!(!is_binary_file_url("not a url at all"));
    }

    #[test]
    fn test_github_blob_transform() {
        let result =
            transform_github_url("https://github.com/rust-lang/rust/blob/master/src/lib.rs");
        assert_eq!(
            result,
            "https://raw.githubusercontent.com/rust-lang/rust/master/src/lib.rs"
        );
    }

    #[test]
    fn test_github_blob_nested_path() {
        let result = transform_github_url(
            "https://github.com/owner/repo/blob/main/docs/guide/intro.md",
        );
        assert_eq!(
            result,
            "https://raw.githubusercontent.com/owner/repo/main/docs/guide/intro.md"
        );
    }

    #[test]
    fn test_github_tree_unchanged() {
        let url = "https://github.com/owner/repo/tree/main/docs";
        assert_eq!(transform_github_url(url), url);
    }

    #[test]
    fn test_github_transform_idempotent() {
        let once =
            transform_github_url("https://github.com/owner/repo/blob/main/README.md");
        let twice = transform_github_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_github_unchanged() {
        let url = "https://gitlab.com/owner/repo/blob/main/README.md";
        assert_eq!(transform_github_url(url), url);
    }

    #[test]
    fn test_github_repo_root_unchanged() {
        let url = "https://github.com/owner/repo";
        assert_eq!(transform_github_url(url), url);
    }

    #[test]
    fn test_malformed_url_unchanged() {
        assert_eq!(transform_github_url("not a url"), "not a url");
    }
}

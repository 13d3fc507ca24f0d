//! Documentation-site profiles
//!
//! Documentation generators wrap their real content in framework-specific
//! containers. Knowing the container tells the fetch layer two things:
//! which element must be present for a page to count as fully rendered
//! (the content-ready check), and which subtree to convert to markdown so
//! navigation chrome stays out of the stored text.

use url::Url;

/// Documentation framework conventions recognized by the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocFramework {
    /// No recognized generator; the whole `body` is the content
    Generic,
    Docusaurus,
    Mkdocs,
    Sphinx,
    Gitbook,
    Vitepress,
    Starlight,
}

impl DocFramework {
    /// Detects the framework from URL hints and generator markers in the HTML
    ///
    /// Detection is best-effort; anything unrecognized is `Generic`, which
    /// always matches.
    pub fn detect(url: &str, html: &str) -> Self {
        if html.contains("docusaurus") {
            return Self::Docusaurus;
        }
        if html.contains("mkdocs") || html.contains("md-content") {
            return Self::Mkdocs;
        }
        if html.contains("sphinx") || html.contains("rst-content") {
            return Self::Sphinx;
        }
        if html.contains("gitbook") {
            return Self::Gitbook;
        }
        if html.contains("vitepress") || html.contains("VPDoc") {
            return Self::Vitepress;
        }
        if html.contains("starlight") {
            return Self::Starlight;
        }

        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                if host.ends_with("readthedocs.io") {
                    return Self::Sphinx;
                }
                if host.ends_with("gitbook.io") {
                    return Self::Gitbook;
                }
            }
        }

        Self::Generic
    }

    /// The CSS selector that must match for the page content to be ready
    pub fn content_selector(&self) -> &'static str {
        match self {
            Self::Generic => "body",
            Self::Docusaurus => "article",
            Self::Mkdocs => ".md-content",
            Self::Sphinx => ".rst-content, div[role='main']",
            Self::Gitbook => "main",
            Self::Vitepress => ".VPDoc, main",
            Self::Starlight => "main",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Docusaurus => "docusaurus",
            Self::Mkdocs => "mkdocs",
            Self::Sphinx => "sphinx",
            Self::Gitbook => "gitbook",
            Self::Vitepress => "vitepress",
            Self::Starlight => "starlight",
        }
    }
}

/// Returns true if the URL looks like a documentation site
///
/// Host/path heuristics only; used for logging and for biasing the
/// content-root selection toward framework selectors.
pub fn is_documentation_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(p) => p,
        Err(_) => return false,
    };

    if let Some(host) = parsed.host_str() {
        if host.starts_with("docs.")
            || host.ends_with("readthedocs.io")
            || host.ends_with("github.io")
            || host.ends_with("gitbook.io")
        {
            return true;
        }
    }

    let path = parsed.path();
    path.starts_with("/docs") || path.contains("/documentation")
}

/// Markdown-rendering configuration shared by all crawl strategies
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Rendered markdown shorter than this fails content validation
    pub min_content_length: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_content_length: 50,
        }
    }
}

/// Per-run site profile: detected documentation status plus render options
#[derive(Debug, Clone, Default)]
pub struct SiteProfile {
    pub is_documentation: bool,
    pub render: RenderOptions,
}

impl SiteProfile {
    /// Builds a profile for the requested URL
    pub fn for_url(url: &str, min_content_length: usize) -> Self {
        Self {
            is_documentation: is_documentation_url(url),
            render: RenderOptions { min_content_length },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_docusaurus_marker() {
        let html = r#"<html><body><div id="__docusaurus">x</div></body></html>"#;
        assert_eq!(
            DocFramework::detect("https://x.test/docs", html),
            DocFramework::Docusaurus
        );
    }

    #[test]
    fn test_detect_mkdocs_marker() {
        let html = r#"<html><body><div class="md-content">x</div></body></html>"#;
        assert_eq!(
            DocFramework::detect("https://x.test/", html),
            DocFramework::Mkdocs
        );
    }

    #[test]
    fn test_detect_readthedocs_host() {
        assert_eq!(
            DocFramework::detect("https://proj.readthedocs.io/en/latest/", "<html></html>"),
            DocFramework::Sphinx
        );
    }

    #[test]
    fn test_detect_generic_fallback() {
        assert_eq!(
            DocFramework::detect("https://x.test/", "<html><body>hi</body></html>"),
            DocFramework::Generic
        );
    }

    #[test]
    fn test_generic_selector_is_body() {
        assert_eq!(DocFramework::Generic.content_selector(), "body");
    }

    #[test]
    fn test_documentation_url_heuristics() {
        assert!(is_documentation_url("https://docs.rs/tokio"));
        assert!(is_documentation_url("https://x.test/docs/intro"));
        assert!(is_documentation_url("https://proj.readthedocs.io/en/latest/"));
        assert!(!is_documentation_url("https://x.test/blog/post"));
        assert!(!is_documentation_url("not a url"));
    }
}

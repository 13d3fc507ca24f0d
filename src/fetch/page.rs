//! Page rendering: HTML to markdown plus link extraction
//!
//! A fetched page becomes a [`PageResult`]: markdown rendered from the
//! framework's content root, the raw HTML, the title, and outbound links
//! partitioned into internal/external. Results are produced once and never
//! mutated afterwards.

use crate::site::DocFramework;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// One successfully fetched page
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The URL that was fetched
    pub url: String,

    /// Content rendered as markdown
    pub markdown: String,

    /// The raw HTML body (empty for text files)
    pub html: String,

    /// Page title, if one was found
    pub title: Option<String>,

    /// Same-host links found on the page
    pub internal_links: Vec<String>,

    /// Links pointing off-host
    pub external_links: Vec<String>,
}

impl PageResult {
    /// Builds a result for a plain-text file; the body is the markdown
    pub fn from_text(url: &str, body: String) -> Self {
        let title = Url::parse(url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|segments| segments.last().map(|s| s.to_string()))
            })
            .filter(|s| !s.is_empty());

        Self {
            url: url.to_string(),
            markdown: body,
            html: String::new(),
            title,
            internal_links: Vec::new(),
            external_links: Vec::new(),
        }
    }
}

/// Outcome of rendering one HTML page
#[derive(Debug)]
pub struct RenderedPage {
    pub page: PageResult,

    /// Which documentation framework the page was recognized as
    pub framework: DocFramework,

    /// Whether the framework's content selector actually matched
    ///
    /// False means the page was served before its content container
    /// rendered; the single-page strategy treats that as a validation
    /// failure and retries.
    pub content_root_found: bool,
}

/// Renders a fetched HTML body into a [`RenderedPage`]
///
/// The documentation framework is detected per page; its content selector
/// picks the subtree converted to markdown so navigation chrome stays out
/// of the stored text. Link extraction always runs over the full document.
pub fn render_page(url: &Url, html: &str) -> RenderedPage {
    let framework = DocFramework::detect(url.as_str(), html);

    let document = Html::parse_document(html);

    let (content_html, content_root_found) = select_content_root(&document, framework, html);
    let markdown = html2md::parse_html(&strip_non_content(&content_html))
        .trim()
        .to_string();

    let title = extract_title(&document);
    let (internal_links, external_links) = extract_links(&document, url);

    RenderedPage {
        page: PageResult {
            url: url.to_string(),
            markdown,
            html: html.to_string(),
            title,
            internal_links,
            external_links,
        },
        framework,
        content_root_found,
    }
}

/// Picks the content subtree for the detected framework
fn select_content_root(
    document: &Html,
    framework: DocFramework,
    full_html: &str,
) -> (String, bool) {
    if let Ok(selector) = Selector::parse(framework.content_selector()) {
        if let Some(element) = document.select(&selector).next() {
            return (element.inner_html(), true);
        }
    }

    // Content container not rendered; fall back to the whole document so
    // the caller can still inspect what came back.
    (full_html.to_string(), false)
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts `a[href]` links, resolved to absolute URLs and partitioned by host
fn extract_links(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return (internal, external),
    };

    let base_host = host_key(base_url);

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };

        let resolved = match resolve_link(href, base_url) {
            Some(u) => u,
            None => continue,
        };

        if host_key(&resolved) == base_host {
            internal.push(resolved.to_string());
        } else {
            external.push(resolved.to_string());
        }
    }

    (internal, external)
}

/// Resolves a href against the base URL, filtering non-fetchable schemes
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = base_url.join(trimmed).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Host comparison key: lowercased, `www.` stripped
fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Drops script/style/noscript subtrees before markdown conversion
fn strip_non_content(html: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| {
        Regex::new(r"(?is)<script.*?</script>|<style.*?</style>|<noscript.*?</noscript>")
            .expect("static strip pattern")
    });
    strip.replace_all(html, "").into_owned()
}

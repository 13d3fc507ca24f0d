//! Sitemap strategy: expand an XML sitemap, then batch-fetch it
//!
//! Sitemaps in the wild disagree about namespaces (`<loc>`, `<ns:loc>`,
//! attributes on the element), so `<loc>` extraction is deliberately
//! namespace-agnostic rather than schema-validating. The resulting flat
//! URL list is handed to the batch strategy.

use crate::fetch::fetch_body;
use crate::strategy::{crawl_batch, CrawlContext, CrawlHarvest, ProgressWindow};
use crate::CrawlError;
use regex::Regex;
use std::sync::OnceLock;

/// Extracts all `<loc>` values from sitemap XML
///
/// Tolerates namespace prefixes and attributes on the element; basic XML
/// entities inside the value are decoded. Order is preserved.
pub fn parse_sitemap_urls(xml: &str) -> Vec<String> {
    static LOC: OnceLock<Regex> = OnceLock::new();
    let loc = LOC.get_or_init(|| {
        Regex::new(r"(?is)<(?:[a-z][\w.-]*:)?loc(?:\s[^>]*)?>\s*([^<]+?)\s*</(?:[a-z][\w.-]*:)?loc>")
            .expect("static loc pattern")
    });

    loc.captures_iter(xml)
        .map(|captures| decode_entities(&captures[1]))
        .filter(|url| !url.is_empty())
        .collect()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .trim()
        .to_string()
}

/// Crawls every URL listed in the sitemap at `sitemap_url`
///
/// The sitemap fetch itself is fatal on failure (there is nothing else to
/// crawl); individual page failures afterwards follow batch semantics. An
/// empty sitemap yields an empty harvest, which the orchestrator turns
/// into a no-content error.
pub async fn crawl_sitemap(
    ctx: &CrawlContext,
    sitemap_url: &str,
) -> Result<CrawlHarvest, CrawlError> {
    tracing::info!("fetching sitemap {}", sitemap_url);

    let xml = fetch_body(&ctx.client, sitemap_url)
        .await
        .map_err(|e| CrawlError::Fetch {
            url: sitemap_url.to_string(),
            message: e.to_string(),
        })?;

    let urls = parse_sitemap_urls(&xml);
    tracing::info!("sitemap {} lists {} urls", sitemap_url, urls.len());

    if urls.is_empty() {
        return Ok(CrawlHarvest::default());
    }

    Ok(crawl_batch(ctx, &urls, ProgressWindow::FULL).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://x.test/a</loc></url>
              <url><loc>https://x.test/b</loc><lastmod>2024-01-01</lastmod></url>
            </urlset>"#;

        let urls = parse_sitemap_urls(xml);
        assert_eq!(urls, vec!["https://x.test/a", "https://x.test/b"]);
    }

    #[test]
    fn test_parse_namespaced_loc() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sm:url><sm:loc>https://x.test/a</sm:loc></sm:url>
            </sm:urlset>"#;

        let urls = parse_sitemap_urls(xml);
        assert_eq!(urls, vec!["https://x.test/a"]);
    }

    #[test]
    fn test_parse_loc_with_whitespace_and_entities() {
        let xml = "<urlset><url><loc>\n  https://x.test/q?a=1&amp;b=2  \n</loc></url></urlset>";

        let urls = parse_sitemap_urls(xml);
        assert_eq!(urls, vec!["https://x.test/q?a=1&b=2"]);
    }

    #[test]
    fn test_parse_empty_sitemap() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#;
        assert!(parse_sitemap_urls(xml).is_empty());
    }

    #[test]
    fn test_parse_ignores_non_loc_elements() {
        let xml = r#"<urlset>
              <url><location>https://x.test/not-a-loc</location></url>
              <url><loc>https://x.test/real</loc></url>
            </urlset>"#;

        let urls = parse_sitemap_urls(xml);
        assert_eq!(urls, vec!["https://x.test/real"]);
    }
}

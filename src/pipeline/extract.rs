//! Reference code-example extractor
//!
//! Scans stored full text for fenced code blocks. The real content-matching
//! pipeline lives outside this crate; this implementation keeps the
//! interface exercised end-to-end and gives the CLI a meaningful count.

use crate::fetch::PageResult;
use crate::pipeline::traits::{CodeExtractor, ExtractError, ProgressHook};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Counts fenced code blocks of a minimum size
#[derive(Debug, Clone)]
pub struct FencedCodeExtractor {
    /// Blocks with fewer lines than this are ignored as noise
    min_lines: usize,
}

impl FencedCodeExtractor {
    pub fn new(min_lines: usize) -> Self {
        Self { min_lines }
    }
}

impl Default for FencedCodeExtractor {
    fn default() -> Self {
        Self { min_lines: 3 }
    }
}

/// Returns the fenced code blocks in `markdown` (without the fences)
pub fn find_code_blocks(markdown: &str) -> Vec<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?ms)^```[^\n]*\n(.*?)^```\s*$").expect("static fence pattern")
    });

    fence
        .captures_iter(markdown)
        .map(|captures| captures[1].trim_end().to_string())
        .collect()
}

#[async_trait]
impl CodeExtractor for FencedCodeExtractor {
    async fn extract(
        &self,
        pages: &[PageResult],
        url_to_full_text: &HashMap<String, String>,
        on_progress: ProgressHook,
    ) -> Result<usize, ExtractError> {
        let total = pages.len();
        let mut found = 0;

        for (index, page) in pages.iter().enumerate() {
            // Prefer the stored full text; fall back to the page markdown.
            let text = url_to_full_text
                .get(&page.url)
                .map(|s| s.as_str())
                .unwrap_or(&page.markdown);

            found += find_code_blocks(text)
                .iter()
                .filter(|block| block.lines().count() >= self.min_lines)
                .count();

            on_progress(
                (index + 1) as f64 / total.max(1) as f64 * 100.0,
                &format!(
                    "scanned {}/{} documents, {} code examples",
                    index + 1,
                    total,
                    found
                ),
            );
        }

        Ok(found)
    }
}

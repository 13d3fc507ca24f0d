//! Reference document stores
//!
//! `MemoryDocumentStore` backs the integration tests and is the default
//! when no real pipeline is wired in. `MarkdownDirStore` gives the CLI a
//! tangible output: one markdown file per crawled page plus an optional
//! summary index.

use crate::fetch::PageResult;
use crate::orchestrator::CrawlRequest;
use crate::pipeline::traits::{DocumentStore, ProgressHook, StoreError, StoreOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Upper bound on one stored chunk, in characters
const MAX_CHUNK_CHARS: usize = 1200;

/// One stored content chunk
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub source_id: String,
    pub url: String,
    pub content: String,
}

/// Splits markdown into paragraph-aligned chunks
///
/// Paragraphs are packed greedily up to [`MAX_CHUNK_CHARS`]; a single
/// oversized paragraph becomes its own chunk rather than being split
/// mid-sentence.
pub fn chunk_markdown(markdown: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in markdown.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if !current.is_empty() && current.len() + paragraph.len() + 2 > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// In-memory store; chunks are inspectable after the run
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    chunks: Mutex<Vec<StoredChunk>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All chunks stored so far, across every source
    pub fn chunks(&self) -> Vec<StoredChunk> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn store_documents(
        &self,
        pages: &[PageResult],
        _request: &CrawlRequest,
        source_id: &str,
        on_progress: ProgressHook,
    ) -> Result<StoreOutcome, StoreError> {
        let total = pages.len();
        let mut outcome = StoreOutcome::default();

        for (index, page) in pages.iter().enumerate() {
            let chunks = chunk_markdown(&page.markdown);
            let mut stored = self.chunks.lock().unwrap();
            for content in chunks {
                stored.push(StoredChunk {
                    source_id: source_id.to_string(),
                    url: page.url.clone(),
                    content,
                });
                outcome.chunk_count += 1;
            }
            drop(stored);

            outcome
                .url_to_full_text
                .insert(page.url.clone(), page.markdown.clone());

            on_progress(
                (index + 1) as f64 / total.max(1) as f64 * 100.0,
                &format!("stored {}/{} documents", index + 1, total),
            );
        }

        Ok(outcome)
    }
}

/// Writes one markdown file per page into a directory
#[derive(Debug)]
pub struct MarkdownDirStore {
    dir: PathBuf,
}

impl MarkdownDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Filesystem-safe file name derived from the URL
    fn file_name(url: &str) -> String {
        let mut name: String = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        name.truncate(120);
        format!("{}.md", name.trim_matches('_'))
    }
}

#[async_trait]
impl DocumentStore for MarkdownDirStore {
    async fn store_documents(
        &self,
        pages: &[PageResult],
        request: &CrawlRequest,
        source_id: &str,
        on_progress: ProgressHook,
    ) -> Result<StoreOutcome, StoreError> {
        fs::create_dir_all(&self.dir)?;

        let total = pages.len();
        let mut outcome = StoreOutcome::default();

        for (index, page) in pages.iter().enumerate() {
            let mut document = String::new();
            document.push_str(&format!(
                "# {}\n\n",
                page.title.as_deref().unwrap_or(&page.url)
            ));
            document.push_str(&format!("- **URL**: {}\n", page.url));
            document.push_str(&format!("- **Source**: {}\n", source_id));
            document.push_str(&format!("- **Knowledge type**: {}\n", request.knowledge_type));
            if !request.tags.is_empty() {
                let tags: Vec<&str> = request.tags.iter().map(|t| t.as_str()).collect();
                document.push_str(&format!("- **Tags**: {}\n", tags.join(", ")));
            }
            document.push_str("\n---\n\n");
            document.push_str(&page.markdown);
            document.push('\n');

            fs::write(self.dir.join(Self::file_name(&page.url)), &document)?;

            outcome.chunk_count += chunk_markdown(&page.markdown).len();
            outcome
                .url_to_full_text
                .insert(page.url.clone(), page.markdown.clone());

            on_progress(
                (index + 1) as f64 / total.max(1) as f64 * 100.0,
                &format!("wrote {}/{} documents", index + 1, total),
            );
        }

        if request.generate_summary {
            let mut index_md = String::from("# Crawl Summary\n\n");
            index_md.push_str(&format!("- **Source**: {}\n", source_id));
            index_md.push_str(&format!("- **Pages**: {}\n\n", pages.len()));
            for page in pages {
                index_md.push_str(&format!(
                    "- [{}]({})\n",
                    page.title.as_deref().unwrap_or(&page.url),
                    page.url
                ));
            }
            fs::write(self.dir.join("index.md"), index_md)?;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn create_test_page(url: &str, markdown: &str) -> PageResult {
        PageResult {
            url: url.to_string(),
            markdown: markdown.to_string(),
            html: String::new(),
            title: Some("Test Page".to_string()),
            internal_links: Vec::new(),
            external_links: Vec::new(),
        }
    }

    fn create_test_request() -> CrawlRequest {
        CrawlRequest {
            url: "https://x.test/".to_string(),
            knowledge_type: "technical".to_string(),
            tags: BTreeSet::from(["docs".to_string()]),
            max_depth: 1,
            extract_code_examples: false,
            generate_summary: true,
        }
    }

    #[test]
    fn test_chunk_markdown_packs_paragraphs() {
        let markdown = "first paragraph\n\nsecond paragraph\n\nthird paragraph";
        let chunks = chunk_markdown(markdown);

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("first paragraph"));
        assert!(chunks[0].contains("third paragraph"));
    }

    #[test]
    fn test_chunk_markdown_splits_large_input() {
        let paragraph = "x".repeat(800);
        let markdown = format!("{}\n\n{}\n\n{}", paragraph, paragraph, paragraph);
        let chunks = chunk_markdown(&markdown);

        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_chunk_markdown_empty() {
        assert!(chunk_markdown("").is_empty());
        assert!(chunk_markdown("\n\n\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_counts_and_full_text() {
        let store = MemoryDocumentStore::new();
        let pages = vec![
            create_test_page("https://x.test/a", "content of a"),
            create_test_page("https://x.test/b", "content of b"),
        ];

        let outcome = store
            .store_documents(
                &pages,
                &create_test_request(),
                "src-1",
                Arc::new(|_: f64, _: &str| {}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.chunk_count, 2);
        assert_eq!(store.chunk_count(), 2);
        assert_eq!(
            outcome.url_to_full_text.get("https://x.test/a").unwrap(),
            "content of a"
        );
    }

    #[tokio::test]
    async fn test_memory_store_progress_callbacks() {
        let store = MemoryDocumentStore::new();
        let pages = vec![create_test_page("https://x.test/a", "content")];

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        store
            .store_documents(
                &pages,
                &create_test_request(),
                "src-1",
                Arc::new(move |pct: f64, msg: &str| {
                    seen_clone.lock().unwrap().push((pct as i32, msg.to_string()));
                }),
            )
            .await
            .unwrap();

        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 100);
    }

    #[tokio::test]
    async fn test_markdown_dir_store_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkdownDirStore::new(dir.path());
        let pages = vec![create_test_page("https://x.test/docs/a", "body text")];

        let outcome = store
            .store_documents(
                &pages,
                &create_test_request(),
                "src-1",
                Arc::new(|_: f64, _: &str| {}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.chunk_count, 1);

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert!(entries.iter().any(|name| name.contains("x.test_docs_a")));
        // generate_summary was requested, so the index exists too.
        assert!(entries.contains(&"index.md".to_string()));
    }
}

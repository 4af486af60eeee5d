//! Scrape runner integration tests.
//!
//! Every test drives `scrape_chapters` end-to-end through an in-memory
//! `Fetcher`, so nothing touches the network and the fetch order can be
//! asserted exactly.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use web2md::{
    scrape_chapters, ChapterError, Fetcher, ImageMode, RunProgressCallback, ScrapeConfig,
    Web2MdError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Serves canned bodies and records every URL requested.
#[derive(Default)]
struct MemoryFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, Web2MdError> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Web2MdError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| Web2MdError::DownloadFailed {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

/// Records progress events as strings.
#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl RunProgressCallback for EventLog {
    fn on_run_start(&self, total: usize) {
        self.0.lock().unwrap().push(format!("start {total}"));
    }
    fn on_item_complete(&self, index: usize, _total: usize, label: &str, _bytes: usize) {
        self.0.lock().unwrap().push(format!("ok {index} {label}"));
    }
    fn on_item_error(&self, index: usize, _total: usize, _error: &str) {
        self.0.lock().unwrap().push(format!("err {index}"));
    }
    fn on_run_complete(&self, total: usize, success_count: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {success_count}/{total}"));
    }
}

fn config(docs: &Path, mode: ImageMode, fetcher: Arc<MemoryFetcher>) -> ScrapeConfig {
    ScrapeConfig::builder()
        .docs_dir(docs)
        .image_mode(mode)
        .polite_delay_ms(0)
        .fetcher(fetcher)
        .build()
        .unwrap()
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

const CH1: &str = "https://site.test/a/ch1.htm";
const CH2: &str = "https://site.test/a/ch2.htm";
const CH3: &str = "https://site.test/b/ch3.htm";

// ── Ordering and failure isolation ───────────────────────────────────────────

#[tokio::test]
async fn failed_chapter_does_not_stop_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let fetcher = Arc::new(
        MemoryFetcher::default()
            .with(CH1, "<h1>One</h1><p>first</p>")
            .with(CH3, "<h1>Three</h1><p>third</p>"),
    );
    let config = config(&docs, ImageMode::Remote, Arc::clone(&fetcher));

    let out = scrape_chapters(&urls(&[CH1, CH2, CH3]), &config)
        .await
        .unwrap();

    assert_eq!(fetcher.requests(), urls(&[CH1, CH2, CH3]));
    assert_eq!(out.stats.total_chapters, 3);
    assert_eq!(out.stats.saved_chapters, 2);
    assert_eq!(out.stats.failed_chapters, 1);

    assert!(out.chapters[0].is_ok());
    assert!(matches!(
        out.chapters[1].error,
        Some(ChapterError::FetchFailed { index: 2, .. })
    ));
    assert!(out.chapters[2].is_ok());
    assert_eq!(
        out.failures().map(|c| c.url.as_str()).collect::<Vec<_>>(),
        vec![CH2]
    );

    assert_eq!(read(docs.join("One.md")), "# One\n\nfirst\n");
    assert_eq!(read(docs.join("Three.md")), "# Three\n\nthird\n");
}

#[tokio::test]
async fn progress_events_follow_list_order() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(
        MemoryFetcher::default()
            .with(CH1, "<h1>One</h1>")
            .with(CH3, "<h1>Three</h1>"),
    );
    let log = Arc::new(EventLog::default());
    let config = ScrapeConfig::builder()
        .docs_dir(tmp.path().join("docs"))
        .image_mode(ImageMode::Remote)
        .polite_delay_ms(0)
        .fetcher(fetcher)
        .progress_callback(Arc::clone(&log) as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();

    scrape_chapters(&urls(&[CH1, CH2, CH3]), &config)
        .await
        .unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["start 3", "ok 1 One", "err 2", "ok 3 Three", "done 2/3"]
    );
}

#[tokio::test]
async fn same_title_last_writer_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let fetcher = Arc::new(
        MemoryFetcher::default()
            .with(CH1, "<h1>Intro</h1><p>old</p>")
            .with(CH2, "<h1>Intro</h1><p>new</p>"),
    );
    let config = config(&docs, ImageMode::Remote, fetcher);

    let out = scrape_chapters(&urls(&[CH1, CH2]), &config).await.unwrap();

    assert_eq!(out.stats.saved_chapters, 2);
    assert_eq!(read(docs.join("Intro.md")), "# Intro\n\nnew\n");
}

// ── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn downloaded_images_get_run_unique_names() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let fetcher = Arc::new(
        MemoryFetcher::default()
            .with(CH1, r#"<h1>One</h1><img src="img/diagram.png" alt="D1">"#)
            .with(CH3, r#"<h1>Three</h1><img src="img/diagram.png" alt="D3">"#)
            .with("https://site.test/a/img/diagram.png", b"first".to_vec())
            .with("https://site.test/b/img/diagram.png", b"second".to_vec()),
    );
    let config = config(&docs, ImageMode::Download, fetcher);

    let out = scrape_chapters(&urls(&[CH1, CH3]), &config).await.unwrap();

    assert_eq!(out.stats.images_downloaded, 2);
    assert_eq!(read(docs.join("One.md")), "# One\n\n![D1](images/diagram.png)\n");
    assert_eq!(
        read(docs.join("Three.md")),
        "# Three\n\n![D3](images/diagram_2.png)\n"
    );
    assert_eq!(std::fs::read(docs.join("images/diagram.png")).unwrap(), b"first");
    assert_eq!(std::fs::read(docs.join("images/diagram_2.png")).unwrap(), b"second");
}

#[tokio::test]
async fn repeated_image_is_downloaded_once_per_chapter() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let image = "https://site.test/a/logo.gif";
    let fetcher = Arc::new(
        MemoryFetcher::default()
            .with(
                CH1,
                r#"<h1>One</h1><img src="logo.gif" alt="L"><p>mid</p><img src="/a/logo.gif" alt="L">"#,
            )
            .with(image, b"GIF89a".to_vec()),
    );
    let config = config(&docs, ImageMode::Download, Arc::clone(&fetcher));

    let out = scrape_chapters(&urls(&[CH1]), &config).await.unwrap();

    assert_eq!(fetcher.count(image), 1);
    assert_eq!(out.chapters[0].images_downloaded, 1);
    assert_eq!(
        read(docs.join("One.md")),
        "# One\n\n![L](images/logo.gif)\n\nmid\n\n![L](images/logo.gif)\n"
    );
}

#[tokio::test]
async fn failed_image_download_links_remote_url() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let fetcher = Arc::new(
        MemoryFetcher::default().with(CH1, r#"<h1>One</h1><img src="gone.png"><p>after</p>"#),
    );
    let config = config(&docs, ImageMode::Download, fetcher);

    let out = scrape_chapters(&urls(&[CH1]), &config).await.unwrap();

    assert!(out.chapters[0].is_ok());
    assert_eq!(out.stats.images_failed, 1);
    assert_eq!(
        read(docs.join("One.md")),
        "# One\n\n![Image](https://site.test/a/gone.png)\n\nafter\n"
    );
}

#[tokio::test]
async fn remote_mode_creates_no_image_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let fetcher = Arc::new(
        MemoryFetcher::default().with(CH1, r#"<h1>One</h1><img src="pic.jpg" alt="P">"#),
    );
    let config = config(&docs, ImageMode::Remote, Arc::clone(&fetcher));

    scrape_chapters(&urls(&[CH1]), &config).await.unwrap();

    assert_eq!(fetcher.requests(), urls(&[CH1]));
    assert!(!docs.join("images").exists());
    assert_eq!(
        read(docs.join("One.md")),
        "# One\n\n![P](https://site.test/a/pic.jpg)\n"
    );
}

// ── Code blocks ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn code_keeps_indentation_and_page_language() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    let html = "<h1>Code</h1>\
        <pre class=\"language-html\">&lt;p&gt;\n    hi\n&lt;/p&gt;</pre>\
        <pre>let x  = 1;</pre>";
    let fetcher = Arc::new(MemoryFetcher::default().with(CH1, html));
    let config = config(&docs, ImageMode::Remote, fetcher);

    scrape_chapters(&urls(&[CH1]), &config).await.unwrap();

    assert_eq!(
        read(docs.join("Code.md")),
        "# Code\n\n```html\n<p>\n    hi\n</p>\n```\n\n```javascript\nlet x  = 1;\n```\n"
    );
}

//! Document transducer: one chapter page → one Markdown document.
//!
//! ## Stages
//!
//! ```text
//! HTML ──▶ parse ──▶ resolve images ──▶ render ──▶ fragments
//!          (pure)    (download / remote)  (pure)
//! ```
//!
//! 1. [`parse_document`] walks `h2, h3, p, pre, img` in document order and
//!    separately collects the first image of every configured container.
//! 2. Each image `src` is resolved against the page URL. Unresolvable
//!    images are dropped. With an [`ImageStore`] the image is downloaded and
//!    linked relatively; on failure, or without a store, the absolute URL is
//!    linked instead.
//! 3. Container images whose URL the primary walk already emitted are
//!    skipped; the rest are appended after the primary walk, in order.
//! 4. [`render_fragments`] formats the nodes, title first.
//!
//! Image downloads are awaited one by one, so every file exists on disk
//! before [`Transducer::transduce`] returns and the fragment order is fixed.

use crate::config::ScrapeConfig;
use crate::error::Web2MdError;
use crate::pipeline::images::{resolve_url, ImageStore};
use crate::pipeline::parse::{compile_selectors, parse_document, ContentNode};
use crate::pipeline::render::{join_fragments, render_fragments};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Alt text for walk images that have none.
pub const DEFAULT_ALT: &str = "Image";
/// Alt text for container images that have none.
pub const DEFAULT_EXTRA_ALT: &str = "Additional Image";

/// Markdown produced for one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transduction {
    /// Chapter title (or the placeholder).
    pub title: String,
    /// Whether `title` came from the page rather than the placeholder.
    pub title_found: bool,
    /// `# title` followed by one fragment per emitted node.
    pub fragments: Vec<String>,
    /// Images written to the image directory.
    pub images_downloaded: usize,
    /// Images whose download failed and now link the remote URL.
    pub images_failed: usize,
    /// Images dropped because their `src` could not be resolved.
    pub images_skipped: usize,
}

impl Transduction {
    /// The full document, fragments separated by blank lines.
    pub fn markdown(&self) -> String {
        join_fragments(&self.fragments)
    }

    /// Nothing but a placeholder heading.
    pub fn is_empty(&self) -> bool {
        !self.title_found && self.fragments.len() <= 1
    }
}

/// Reusable transducer holding the compiled container selectors.
#[derive(Debug, Clone)]
pub struct Transducer {
    containers: Vec<Selector>,
    placeholder_title: String,
    code_language: Option<String>,
}

impl Default for Transducer {
    fn default() -> Self {
        let config = ScrapeConfig::default();
        Self {
            containers: compile_selectors(&config.image_containers).unwrap_or_default(),
            placeholder_title: config.placeholder_title,
            code_language: config.code_language,
        }
    }
}

#[derive(Default)]
struct ImageTally {
    downloaded: usize,
    failed: usize,
    skipped: usize,
}

impl Transducer {
    /// Build from the scrape config; fails on an invalid container selector.
    pub fn new(config: &ScrapeConfig) -> Result<Self, Web2MdError> {
        Ok(Self {
            containers: compile_selectors(&config.image_containers)?,
            placeholder_title: config.placeholder_title.clone(),
            code_language: config.code_language.clone(),
        })
    }

    /// Convert `html`, fetched from `page_url`, into Markdown.
    ///
    /// `images = None` links every image by its absolute URL and performs no
    /// I/O; `Some(store)` downloads each distinct image once.
    pub async fn transduce(
        &self,
        html: &str,
        page_url: &str,
        images: Option<&ImageStore>,
    ) -> Transduction {
        let parsed = parse_document(html, &self.containers);
        let title_found = parsed.title.is_some();
        let title = parsed
            .title
            .unwrap_or_else(|| self.placeholder_title.clone());

        let mut tally = ImageTally::default();
        let mut links: HashMap<String, String> = HashMap::new();
        let mut nodes = Vec::with_capacity(parsed.nodes.len() + parsed.extra_images.len());

        for node in parsed.nodes {
            match node {
                ContentNode::Image { src, alt } => {
                    let Some(absolute) = resolve_url(page_url, &src) else {
                        debug!("Skipping unresolvable image src '{}' on {}", src, page_url);
                        tally.skipped += 1;
                        continue;
                    };
                    let link = self.link_for(&absolute, images, &mut links, &mut tally).await;
                    nodes.push(ContentNode::Image {
                        src: link,
                        alt: Some(alt.unwrap_or_else(|| DEFAULT_ALT.to_string())),
                    });
                }
                other => nodes.push(other),
            }
        }

        for node in parsed.extra_images {
            let ContentNode::Image { src, alt } = node else {
                continue;
            };
            let Some(absolute) = resolve_url(page_url, &src) else {
                tally.skipped += 1;
                continue;
            };
            if links.contains_key(&absolute) {
                continue;
            }
            let link = self.link_for(&absolute, images, &mut links, &mut tally).await;
            debug!("Additional image: {}", link);
            nodes.push(ContentNode::Image {
                src: link,
                alt: Some(alt.unwrap_or_else(|| DEFAULT_EXTRA_ALT.to_string())),
            });
        }

        let fragments = render_fragments(&title, &nodes, self.code_language.as_deref());

        Transduction {
            title,
            title_found,
            fragments,
            images_downloaded: tally.downloaded,
            images_failed: tally.failed,
            images_skipped: tally.skipped,
        }
    }

    /// Remote-mode conversion without an async runtime.
    pub fn transduce_remote(&self, html: &str, page_url: &str) -> Transduction {
        futures::executor::block_on(self.transduce(html, page_url, None))
    }

    /// Link target for `absolute`, downloading at most once per chapter.
    async fn link_for(
        &self,
        absolute: &str,
        images: Option<&ImageStore>,
        links: &mut HashMap<String, String>,
        tally: &mut ImageTally,
    ) -> String {
        if let Some(link) = links.get(absolute) {
            return link.clone();
        }
        let link = match images {
            None => absolute.to_string(),
            Some(store) => match store.store(absolute).await {
                Ok(relative) => {
                    tally.downloaded += 1;
                    relative
                }
                Err(e) => {
                    warn!("Failed to download image: {} ({})", absolute, e);
                    tally.failed += 1;
                    absolute.to_string()
                }
            },
        };
        links.insert(absolute.to_string(), link.clone());
        link
    }
}

/// Convert one page with default settings, linking images remotely.
pub fn html_to_markdown(html: &str, page_url: &str) -> String {
    Transducer::default()
        .transduce_remote(html, page_url)
        .markdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fetch::Fetcher;
    use async_trait::async_trait;
    use std::sync::Arc;

    const PAGE: &str = "https://example.com/docs/ch1";

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, Web2MdError> {
            Err(Web2MdError::DownloadFailed {
                url: url.into(),
                reason: "HTTP 500".into(),
            })
        }

        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, Web2MdError> {
            self.fetch_text(url).await.map(String::into_bytes)
        }
    }

    #[test]
    fn paragraph_whitespace_is_normalised() {
        let md = html_to_markdown("<h1>T</h1><p>Hello   world</p>", PAGE);
        assert_eq!(md, "# T\n\nHello world\n");
    }

    #[test]
    fn placeholder_title_when_no_h1() {
        let t = Transducer::default().transduce_remote("<p>x</p>", PAGE);
        assert_eq!(t.title, "Untitled");
        assert!(!t.title_found);
        assert!(!t.is_empty());
        assert_eq!(t.fragments[0], "# Untitled");
    }

    #[test]
    fn empty_page_is_empty() {
        let t = Transducer::default().transduce_remote("<div>nothing here</div>", PAGE);
        assert!(t.is_empty());
    }

    #[test]
    fn relative_image_resolves_against_page_url() {
        let t = Transducer::default()
            .transduce_remote(r#"<h1>T</h1><img src="img/a.png" alt="A">"#, PAGE);
        assert_eq!(t.fragments[1], "![A](https://example.com/docs/img/a.png)");
    }

    #[test]
    fn walk_image_without_alt_gets_default() {
        let t = Transducer::default().transduce_remote(r#"<img src="/a.png">"#, PAGE);
        assert_eq!(t.fragments[1], "![Image](https://example.com/a.png)");
    }

    #[test]
    fn code_block_survives_byte_for_byte() {
        let code = "for (let i = 0;  i < 3;  i++) {\n    console.log(i);\n}";
        let html = format!("<h1>T</h1><pre>{code}</pre>");
        let md = html_to_markdown(&html, PAGE);
        assert!(
            md.contains(&format!("```javascript\n{code}\n```")),
            "got: {md}"
        );
    }

    #[test]
    fn container_image_already_walked_is_not_repeated() {
        let html = r#"
            <h1>T</h1>
            <figure><img src="fig.png" alt="Fig"></figure>
            <p>after</p>"#;
        let t = Transducer::default().transduce_remote(html, PAGE);
        assert_eq!(
            t.fragments,
            vec![
                "# T".to_string(),
                "![Fig](https://example.com/docs/fig.png)".to_string(),
                "after".to_string(),
            ]
        );
    }

    #[test]
    fn container_images_are_appended_after_walk() {
        let html = r#"
            <h1>T</h1>
            <div class="example"><pre>run()<img src="out.png"></pre></div>
            <p>after</p>"#;
        let t = Transducer::default().transduce_remote(html, PAGE);
        assert_eq!(
            t.fragments,
            vec![
                "# T".to_string(),
                "```javascript\nrun()\n```".to_string(),
                "after".to_string(),
                "![Additional Image](https://example.com/docs/out.png)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn failed_download_falls_back_to_remote_url() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(Arc::new(FailingFetcher), tmp.path(), "images");
        let html = r#"<h1>T</h1><img src="https://example.com/x.png" alt="Diagram"><p>next</p>"#;

        let t = Transducer::default().transduce(html, PAGE, Some(&store)).await;

        assert_eq!(t.images_failed, 1);
        assert_eq!(t.images_downloaded, 0);
        assert_eq!(t.fragments[1], "![Diagram](https://example.com/x.png)");
        assert_eq!(t.fragments[2], "next");
    }
}

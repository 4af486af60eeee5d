//! Result types returned by the scrape and PDF entry points.
//!
//! Everything here is `Serialize` so the CLI can emit a `--json` report.

use crate::error::ChapterError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one chapter, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterResult {
    /// 1-based position in the link list.
    pub index: usize,
    /// The chapter URL as listed.
    pub url: String,
    /// Resolved title; empty when the fetch failed.
    pub title: String,
    /// Written Markdown file.
    pub path: Option<PathBuf>,
    /// Number of Markdown fragments, title included.
    pub fragments: usize,
    /// Byte length of the written Markdown.
    pub markdown_len: usize,
    pub images_downloaded: usize,
    pub images_failed: usize,
    pub images_skipped: usize,
    /// Fetch + transduce + write, in milliseconds.
    pub duration_ms: u64,
    pub error: Option<ChapterError>,
}

impl ChapterResult {
    pub(crate) fn failed(index: usize, url: &str, error: ChapterError, duration_ms: u64) -> Self {
        Self {
            index,
            url: url.to_string(),
            title: String::new(),
            path: None,
            fragments: 0,
            markdown_len: 0,
            images_downloaded: 0,
            images_failed: 0,
            images_skipped: 0,
            duration_ms,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a scrape run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeStats {
    pub total_chapters: usize,
    pub saved_chapters: usize,
    pub failed_chapters: usize,
    pub images_downloaded: usize,
    pub images_failed: usize,
    pub total_duration_ms: u64,
}

/// Everything a scrape run produced, chapters in link-list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutput {
    pub chapters: Vec<ChapterResult>,
    pub stats: ScrapeStats,
}

impl ScrapeOutput {
    /// Failed chapters, in order.
    pub fn failures(&self) -> impl Iterator<Item = &ChapterResult> {
        self.chapters.iter().filter(|c| !c.is_ok())
    }
}

/// Outcome of converting one Markdown file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfFileResult {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Size of the written PDF.
    pub bytes: usize,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Everything a PDF batch produced, sorted by source file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfOutput {
    pub files: Vec<PdfFileResult>,
    pub converted: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Outcome of link extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkOutput {
    pub links: Vec<String>,
    /// Anchors matched by the selector but rejected (no `href`, unresolvable,
    /// or outside the path prefix).
    pub rejected: usize,
    pub path: PathBuf,
}

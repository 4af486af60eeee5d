//! Chapter runner: link list → one Markdown file per chapter.
//!
//! Chapters are processed strictly in list order, one at a time, with the
//! configured polite delay between fetches. A chapter that fails (fetch,
//! empty page, write) is logged, recorded in its [`ChapterResult`] and
//! skipped; only an unreadable link list or an output directory that cannot
//! be created aborts the run.

use crate::config::{ImageMode, ScrapeConfig};
use crate::error::{ChapterError, Web2MdError};
use crate::links::read_link_list;
use crate::output::{ChapterResult, ScrapeOutput, ScrapeStats};
use crate::pipeline::fetch::{Fetcher, HttpFetcher};
use crate::pipeline::images::ImageStore;
use crate::pipeline::write;
use crate::transduce::Transducer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Read `config.links_file` and scrape every listed chapter.
pub async fn scrape_from_file(config: &ScrapeConfig) -> Result<ScrapeOutput, Web2MdError> {
    let links = read_link_list(&config.links_file).await?;
    info!("Found {} chapters.", links.len());
    scrape_chapters(&links, config).await
}

/// Scrape `links` in order into `config.docs_dir`.
///
/// Returns `Ok` even when chapters failed; check `output.stats.failed_chapters`.
pub async fn scrape_chapters(
    links: &[String],
    config: &ScrapeConfig,
) -> Result<ScrapeOutput, Web2MdError> {
    let run_start = Instant::now();
    let transducer = Transducer::new(config)?;
    let fetcher = resolve_fetcher(config)?;

    // ── Output directories ───────────────────────────────────────────────
    write::ensure_dir(&config.docs_dir).await?;
    let images = match config.image_mode {
        ImageMode::Download => {
            let dir = config.images_dir();
            write::ensure_dir(&dir).await?;
            Some(ImageStore::new(
                Arc::clone(&fetcher),
                dir,
                &config.images_subdir,
            ))
        }
        ImageMode::Remote => None,
    };

    let total = links.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Chapters, strictly in order ──────────────────────────────────────
    let mut chapters = Vec::with_capacity(total);
    for (i, url) in links.iter().enumerate() {
        let index = i + 1;
        if i > 0 && config.polite_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.polite_delay_ms)).await;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(index, total, url);
        }

        let result =
            scrape_chapter(index, url, fetcher.as_ref(), &transducer, images.as_ref(), config)
                .await;

        match &result.error {
            None => {
                info!("Saved: {}", result.title);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_complete(index, total, &result.title, result.markdown_len);
                }
            }
            Some(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(index, total, &e.to_string());
                }
            }
        }
        chapters.push(result);
    }

    // ── Stats ────────────────────────────────────────────────────────────
    let saved = chapters.iter().filter(|c| c.is_ok()).count();
    let stats = ScrapeStats {
        total_chapters: total,
        saved_chapters: saved,
        failed_chapters: total - saved,
        images_downloaded: chapters.iter().map(|c| c.images_downloaded).sum(),
        images_failed: chapters.iter().map(|c| c.images_failed).sum(),
        total_duration_ms: run_start.elapsed().as_millis() as u64,
    };

    info!(
        "Scrape complete: {}/{} chapters saved in {}, {} images downloaded",
        saved,
        total,
        config.docs_dir.display(),
        stats.images_downloaded
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, saved);
    }

    Ok(ScrapeOutput { chapters, stats })
}

/// Fetch, transduce and save one chapter. Never fails the run.
pub async fn scrape_chapter(
    index: usize,
    url: &str,
    fetcher: &dyn Fetcher,
    transducer: &Transducer,
    images: Option<&ImageStore>,
    config: &ScrapeConfig,
) -> ChapterResult {
    let start = Instant::now();
    let elapsed = || start.elapsed().as_millis() as u64;
    info!("Scraping: {}", url);

    let html = match fetcher.fetch_text(url).await {
        Ok(html) => html,
        Err(e) => {
            let err = ChapterError::FetchFailed {
                index,
                url: url.to_string(),
                detail: e.to_string(),
            };
            return ChapterResult::failed(index, url, err, elapsed());
        }
    };

    let transduction = transducer.transduce(&html, url, images).await;
    if transduction.is_empty() {
        let err = ChapterError::NoContent {
            index,
            url: url.to_string(),
        };
        return ChapterResult::failed(index, url, err, elapsed());
    }

    let markdown = transduction.markdown();
    let path = write::chapter_path(&config.docs_dir, &transduction.title);
    if let Err(e) = write::write_atomic(&path, &markdown).await {
        let err = ChapterError::WriteFailed {
            index,
            url: url.to_string(),
            detail: e.to_string(),
        };
        return ChapterResult::failed(index, url, err, elapsed());
    }

    ChapterResult {
        index,
        url: url.to_string(),
        title: transduction.title,
        path: Some(path),
        fragments: transduction.fragments.len(),
        markdown_len: markdown.len(),
        images_downloaded: transduction.images_downloaded,
        images_failed: transduction.images_failed,
        images_skipped: transduction.images_skipped,
        duration_ms: elapsed(),
        error: None,
    }
}

/// Use the configured fetcher, or build the HTTP one.
fn resolve_fetcher(config: &ScrapeConfig) -> Result<Arc<dyn Fetcher>, Web2MdError> {
    if let Some(ref fetcher) = config.fetcher {
        return Ok(Arc::clone(fetcher));
    }
    Ok(Arc::new(HttpFetcher::new(
        config.timeout_secs,
        &config.user_agent,
    )?))
}

//! Progress-callback trait for per-item run events.
//!
//! An "item" is a chapter during [`crate::scrape::scrape_chapters`] and a
//! Markdown file during [`crate::pdf::convert_dir`]. Inject an
//! [`Arc<dyn RunProgressCallback>`] via the matching config to receive events
//! as the run proceeds; the CLI uses this to drive its progress bar.
//!
//! # Example
//!
//! ```rust
//! use web2md::{RunProgressCallback, ScrapeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, label: &str, _bytes: usize) {
//!         let done = self.saved.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{index}/{total} {label} ({done} saved)");
//!     }
//! }
//!
//! let config = ScrapeConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { saved: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the runner and the PDF converter as each item is processed.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The PDF converter processes files concurrently, so
/// implementations must be `Send + Sync` and synchronise their own state.
pub trait RunProgressCallback: Send + Sync {
    /// Called once before the first item.
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before an item is fetched or converted.
    ///
    /// # Arguments
    /// * `index` — 1-based position of the item
    /// * `total` — number of items in the run
    /// * `label` — chapter URL or Markdown file name
    fn on_item_start(&self, index: usize, total: usize, label: &str) {
        let _ = (index, total, label);
    }

    /// Called when an item was written successfully.
    ///
    /// `label` is the chapter title or the written PDF path; `bytes` is the
    /// size of the written output.
    fn on_item_complete(&self, index: usize, total: usize, label: &str, bytes: usize) {
        let _ = (index, total, label, bytes);
    }

    /// Called when an item failed; the run continues with the next one.
    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every item has been attempted.
    fn on_run_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in the config structs.
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

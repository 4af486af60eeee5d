//! Error types for the web2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Web2MdError`] — **Fatal**: the run cannot proceed at all (unreadable
//!   table of contents or link list, output directory cannot be created,
//!   fonts missing). Returned as `Err(Web2MdError)` from the top-level
//!   entry points.
//!
//! * [`ChapterError`] — **Non-fatal**: a single chapter failed (fetch error,
//!   empty page, write error) but the rest of the run is fine. Stored inside
//!   [`crate::output::ChapterResult`] so callers can inspect partial success
//!   rather than losing the whole run to one bad link.
//!
//! Image download failures are not errors at all from the caller's point of
//! view: the Markdown falls back to the remote URL and the failure is counted
//! in [`crate::output::ChapterResult::images_failed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the web2md library.
#[derive(Debug, Error)]
pub enum Web2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading an input file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A string that should be an absolute HTTP/HTTPS URL is not one.
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// A CSS selector in the configuration failed to parse.
    #[error("Invalid CSS selector '{selector}': {detail}")]
    InvalidSelector { selector: String, detail: String },

    // ── Network errors ────────────────────────────────────────────────────
    /// HTTP request failed or returned a non-success status.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Request exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create an output directory.
    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The TrueType font family required for PDF layout could not be loaded.
    #[error(
        "Failed to load font family '{family}' from '{dir}': {detail}\n\
Expected {family}-Regular.ttf, {family}-Bold.ttf, {family}-Italic.ttf and \
{family}-BoldItalic.ttf in that directory (override with --fonts / --font-family)."
    )]
    FontLoadFailed {
        dir: PathBuf,
        family: String,
        detail: String,
    },

    /// genpdf failed to lay out or write a document.
    #[error("PDF rendering failed for '{path}': {detail}")]
    PdfRenderFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Web2MdError {
    /// Map an I/O error from opening `path` to the matching input variant.
    pub(crate) fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Web2MdError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Web2MdError::PermissionDenied { path },
            _ => Web2MdError::ReadFailed { path, source },
        }
    }
}

/// A non-fatal error for a single chapter.
///
/// `index` is the 1-based position of the chapter in the link list.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ChapterError {
    /// Page could not be fetched.
    #[error("Chapter {index}: fetch failed for {url}: {detail}")]
    FetchFailed {
        index: usize,
        url: String,
        detail: String,
    },

    /// Page parsed but had neither a title nor any content nodes.
    #[error("Chapter {index}: no usable title or content at {url}")]
    NoContent { index: usize, url: String },

    /// Markdown could not be written to disk.
    #[error("Chapter {index}: failed to save {url}: {detail}")]
    WriteFailed {
        index: usize,
        url: String,
        detail: String,
    },
}

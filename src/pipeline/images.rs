//! Image resolution, file naming and downloading.
//!
//! ## Naming
//!
//! File names come from the URL's path basename and extension (`image_<n>`
//! and `.jpg` when absent). Tutorial sites reuse names like `diagram.png`
//! across chapters, so [`ImageNamer`] remembers every name handed out during
//! the run and appends `_2`, `_3`, … on collision. Names are therefore
//! unique within a run and stable across identical runs.
//!
//! ## Failure
//!
//! A download failure is never fatal: [`ImageStore::store`] returns the
//! error, and the transducer falls back to the remote URL.

use crate::error::Web2MdError;
use crate::pipeline::fetch::Fetcher;
use crate::pipeline::write;
use reqwest::Url;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Resolve `src` against the page URL. `None` when either side is unusable.
pub fn resolve_url(page_url: &str, src: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let resolved = base.join(src.trim()).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Split a URL path's last segment into `(stem, ".ext")`.
fn split_basename(url: &str) -> (Option<String>, Option<String>) {
    let Ok(parsed) = Url::parse(url) else {
        return (None, None);
    };
    let last = parsed
        .path_segments()
        .and_then(|mut s| s.next_back())
        .unwrap_or("");
    let last = Path::new(last);
    let stem = last
        .file_stem()
        .map(|s| sanitize_component(&s.to_string_lossy()))
        .filter(|s| !s.is_empty());
    let ext = last
        .extension()
        .map(|e| sanitize_component(&e.to_string_lossy()).to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{e}"));
    (stem, ext)
}

/// Keep file-name-safe ASCII characters only.
fn sanitize_component(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Hands out run-unique image file names.
#[derive(Debug, Default)]
pub struct ImageNamer {
    used: HashSet<String>,
    next_index: usize,
}

impl ImageNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for `url`. `sniffed_ext` (e.g. `".png"`) is used when the URL
    /// path has no extension; `.jpg` is the last resort.
    pub fn name_for(&mut self, url: &str, sniffed_ext: Option<&str>) -> String {
        let index = self.next_index;
        self.next_index += 1;

        let (stem, ext) = split_basename(url);
        let stem = stem.unwrap_or_else(|| format!("image_{index}"));
        let ext = ext
            .or_else(|| sniffed_ext.map(str::to_string))
            .unwrap_or_else(|| ".jpg".to_string());

        let mut candidate = format!("{stem}{ext}");
        let mut n = 2;
        // Case-insensitive file systems treat `A.png` and `a.png` as one file.
        while self.used.contains(&candidate.to_lowercase()) {
            candidate = format!("{stem}_{n}{ext}");
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

/// Extension for image bytes whose URL carried none.
pub fn sniff_extension(bytes: &[u8]) -> Option<String> {
    let format = image::guess_format(bytes).ok()?;
    format
        .extensions_str()
        .first()
        .map(|e| format!(".{e}"))
}

/// Downloads images into one directory shared by every chapter of a run.
pub struct ImageStore {
    fetcher: Arc<dyn Fetcher>,
    dir: PathBuf,
    link_prefix: String,
    namer: Mutex<ImageNamer>,
}

impl ImageStore {
    /// `dir` is where files land; `link_prefix` is what the Markdown uses to
    /// reach them (the directory's name relative to the chapter files).
    pub fn new(fetcher: Arc<dyn Fetcher>, dir: impl Into<PathBuf>, link_prefix: &str) -> Self {
        Self {
            fetcher,
            dir: dir.into(),
            link_prefix: link_prefix.trim_end_matches('/').to_string(),
            namer: Mutex::new(ImageNamer::new()),
        }
    }

    /// Download `url`, write it under a unique name and return the relative
    /// Markdown link (`images/<name>`).
    pub async fn store(&self, url: &str) -> Result<String, Web2MdError> {
        let bytes = self.fetcher.fetch_bytes(url).await?;
        let sniffed = sniff_extension(&bytes);
        let filename = self
            .namer
            .lock()
            .map_err(|_| Web2MdError::Internal("image namer lock poisoned".into()))?
            .name_for(url, sniffed.as_deref());

        let path = self.dir.join(&filename);
        write::write_atomic(&path, &bytes).await?;
        debug!("Downloaded image: {} → {}", url, path.display());

        Ok(format!("{}/{}", self.link_prefix, filename))
    }
}

//! Durable output: directories, atomic writes and output file names.
//!
//! Every file this crate produces goes through [`write_atomic`]: the bytes
//! land in a hidden sibling temp file which is then renamed over the target.
//! A rename within one directory is atomic, so a reader (or a later chapter
//! whose title collides) never observes a truncated file.

use crate::error::Web2MdError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Create `dir` and its parents if missing. Idempotent.
pub async fn ensure_dir(dir: &Path) -> Result<(), Web2MdError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Web2MdError::DirectoryCreateFailed {
            path: dir.to_path_buf(),
            source,
        })
}

/// Write `contents` to `path` via temp file + rename.
pub async fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), Web2MdError> {
    let tmp_path = temp_sibling(path);
    let fail = |source| Web2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = tokio::fs::write(&tmp_path, contents.as_ref()).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Turn a chapter title into a file stem.
///
/// Drops everything except ASCII letters, digits, `_`, `-` and whitespace,
/// then replaces whitespace runs with `_`. Titles that sanitise to nothing
/// become `untitled`.
pub fn sanitize_title(title: &str) -> String {
    let kept = RE_UNSAFE.replace_all(title, "");
    let stem = RE_SPACES.replace_all(kept.trim(), "_");
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.into_owned()
    }
}

/// `<dir>/<sanitized title>.md`
pub fn chapter_path(dir: &Path, title: &str) -> PathBuf {
    dir.join(format!("{}.md", sanitize_title(title)))
}

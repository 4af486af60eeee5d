//! Configuration types for link extraction, scraping and PDF conversion.
//!
//! Each stage has one config struct whose [`Default`] matches the standard
//! three-step layout: every path is relative to the working directory (`links.html` → `chapter-links.txt` → `docs/` → `pdfs/`).
//! [`ScrapeConfig`] carries the most knobs and is built through
//! [`ScrapeConfigBuilder`], which validates on `build()`.

use crate::error::Web2MdError;
use crate::pipeline::fetch::Fetcher;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

// ── Link extraction ──────────────────────────────────────────────────────

/// Configuration for [`crate::links::extract_links_to_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Saved table-of-contents HTML. Default: `links.html`.
    pub input: PathBuf,

    /// Newline-joined link list written for the scraper. Default: `chapter-links.txt`.
    pub output: PathBuf,

    /// Base URL that relative `href`s are resolved against.
    /// Default: `https://www.tutorialspoint.com`.
    pub base_url: String,

    /// CSS selector matching the chapter anchors. Default: `ul.toc.chapters li a`.
    pub selector: String,

    /// Only keep links whose resolved path starts with this prefix.
    /// `None` keeps every link. Default: `Some("/javascript/")`.
    pub path_prefix: Option<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("links.html"),
            output: PathBuf::from("chapter-links.txt"),
            base_url: "https://www.tutorialspoint.com".to_string(),
            selector: "ul.toc.chapters li a".to_string(),
            path_prefix: Some("/javascript/".to_string()),
        }
    }
}

// ── Scraping ─────────────────────────────────────────────────────────────

/// How the transducer references images it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageMode {
    /// Download into `<docs>/images/` and reference the relative path.
    /// Falls back to the remote URL when a download fails. (default)
    #[default]
    Download,
    /// Reference the absolute remote URL; no image I/O at all.
    Remote,
}

/// Configuration for [`crate::scrape::scrape_chapters`].
///
/// Built via [`ScrapeConfig::builder()`] or [`ScrapeConfig::default()`].
///
/// # Example
/// ```rust
/// use web2md::{ImageMode, ScrapeConfig};
///
/// let config = ScrapeConfig::builder()
///     .docs_dir("out/docs")
///     .image_mode(ImageMode::Remote)
///     .polite_delay_ms(250)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScrapeConfig {
    /// Link list produced by the link extractor. Default: `chapter-links.txt`.
    pub links_file: PathBuf,

    /// Directory receiving one Markdown file per chapter. Default: `docs`.
    pub docs_dir: PathBuf,

    /// Name of the image subdirectory inside `docs_dir`; also the prefix of
    /// the relative links written into the Markdown. Default: `images`.
    pub images_subdir: String,

    /// Download images or reference them remotely. Default: [`ImageMode::Download`].
    pub image_mode: ImageMode,

    /// Pause between successive chapter fetches in milliseconds. Default: 1000.
    ///
    /// Not applied after the last chapter.
    pub polite_delay_ms: u64,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request. Default: `web2md/<version>`.
    pub user_agent: String,

    /// Title used when a page has no non-empty `<h1>`. Default: `Untitled`.
    pub placeholder_title: String,

    /// Fence language for code blocks without a `language-*` / `lang-*`
    /// class. `None` writes a bare fence. Default: `Some("javascript")`.
    pub code_language: Option<String>,

    /// Containers scanned by the extra image pass (first `<img>` of each).
    /// Default: `div.image`, `figure`, `.example`, `.tutorial`.
    pub image_containers: Vec<String>,

    /// Pre-constructed fetcher. When `None` an HTTP fetcher is built from
    /// `timeout_secs` and `user_agent`.
    pub fetcher: Option<Arc<dyn Fetcher>>,

    /// Optional per-chapter progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            links_file: PathBuf::from("chapter-links.txt"),
            docs_dir: PathBuf::from("docs"),
            images_subdir: "images".to_string(),
            image_mode: ImageMode::default(),
            polite_delay_ms: 1000,
            timeout_secs: 60,
            user_agent: format!("web2md/{}", env!("CARGO_PKG_VERSION")),
            placeholder_title: "Untitled".to_string(),
            code_language: Some("javascript".to_string()),
            image_containers: ["div.image", "figure", ".example", ".tutorial"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fetcher: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeConfig")
            .field("links_file", &self.links_file)
            .field("docs_dir", &self.docs_dir)
            .field("images_subdir", &self.images_subdir)
            .field("image_mode", &self.image_mode)
            .field("polite_delay_ms", &self.polite_delay_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("placeholder_title", &self.placeholder_title)
            .field("code_language", &self.code_language)
            .field("image_containers", &self.image_containers)
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<dyn Fetcher>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl ScrapeConfig {
    /// Create a new builder for `ScrapeConfig`.
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute-or-relative path of the image directory.
    pub fn images_dir(&self) -> PathBuf {
        self.docs_dir.join(&self.images_subdir)
    }
}

/// Builder for [`ScrapeConfig`].
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl fmt::Debug for ScrapeConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ScrapeConfigBuilder {
    pub fn links_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.links_file = path.into();
        self
    }

    pub fn docs_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.docs_dir = path.into();
        self
    }

    pub fn images_subdir(mut self, name: impl Into<String>) -> Self {
        self.config.images_subdir = name.into();
        self
    }

    pub fn image_mode(mut self, mode: ImageMode) -> Self {
        self.config.image_mode = mode;
        self
    }

    pub fn polite_delay_ms(mut self, ms: u64) -> Self {
        self.config.polite_delay_ms = ms;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn placeholder_title(mut self, title: impl Into<String>) -> Self {
        self.config.placeholder_title = title.into();
        self
    }

    pub fn code_language(mut self, lang: Option<String>) -> Self {
        self.config.code_language = lang.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn image_containers(mut self, selectors: Vec<String>) -> Self {
        self.config.image_containers = selectors;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.config.fetcher = Some(fetcher);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScrapeConfig, Web2MdError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(Web2MdError::InvalidConfig(
                "HTTP timeout must be ≥ 1 second".into(),
            ));
        }
        let subdir = c.images_subdir.trim();
        if subdir.is_empty() || subdir.contains(['/', '\\']) || subdir == ".." {
            return Err(Web2MdError::InvalidConfig(format!(
                "images subdirectory must be a single directory name, got '{}'",
                c.images_subdir
            )));
        }
        if c.placeholder_title.trim().is_empty() {
            return Err(Web2MdError::InvalidConfig(
                "placeholder title must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── PDF conversion ───────────────────────────────────────────────────────

/// Configuration for [`crate::pdf::convert_dir`].
#[derive(Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Directory scanned for `*.md` files. Default: `docs`.
    pub docs_dir: PathBuf,

    /// Directory receiving one PDF per Markdown file. Default: `pdfs`.
    pub pdf_dir: PathBuf,

    /// Directory holding the TrueType font family. Default: `fonts`.
    pub font_dir: PathBuf,

    /// Font family name; genpdf loads `<family>-Regular.ttf` and its
    /// Bold/Italic/BoldItalic siblings. Default: `LiberationSans`.
    pub font_family: String,

    /// Body font size in points. Headings scale from it. Default: 11.
    pub font_size: u8,

    /// Page margin in millimetres. Default: 15.
    pub margin_mm: u8,

    /// Number of files laid out at once. Default: 4.
    pub concurrency: usize,

    /// Optional per-file progress events.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            pdf_dir: PathBuf::from("pdfs"),
            font_dir: PathBuf::from("fonts"),
            font_family: "LiberationSans".to_string(),
            font_size: 11,
            margin_mm: 15,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PdfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfConfig")
            .field("docs_dir", &self.docs_dir)
            .field("pdf_dir", &self.pdf_dir)
            .field("font_dir", &self.font_dir)
            .field("font_family", &self.font_family)
            .field("font_size", &self.font_size)
            .field("margin_mm", &self.margin_mm)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl PdfConfig {
    /// Validate constraints that `Default` cannot express.
    pub fn validate(&self) -> Result<(), Web2MdError> {
        if self.concurrency == 0 {
            return Err(Web2MdError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if !(6..=36).contains(&self.font_size) {
            return Err(Web2MdError::InvalidConfig(format!(
                "font size must be 6–36pt, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

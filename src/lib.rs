//! # web2md
//!
//! Mirror an online tutorial as local Markdown files, then typeset them as
//! PDFs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! saved TOC page
//!  │
//!  ├─ 1. Links      extract chapter URLs in table-of-contents order
//!  ├─ 2. Fetch      one chapter at a time, with a polite delay
//!  ├─ 3. Transduce  h2 / h3 / p / pre / img → Markdown fragments
//!  ├─ 4. Images     download next to the chapters, or link remotely
//!  ├─ 5. Write      <sanitised title>.md, atomically
//!  └─ 6. PDF        every .md → .pdf via genpdf (CPU-bound, spawn_blocking)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use web2md::{extract_links_to_file, scrape_from_file, LinkConfig, ScrapeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let links = extract_links_to_file(&LinkConfig::default()).await?;
//!     eprintln!("{} chapters listed", links.links.len());
//!
//!     let output = scrape_from_file(&ScrapeConfig::default()).await?;
//!     for failure in output.failures() {
//!         eprintln!("{}", failure.url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Single pages can be converted without touching the network:
//!
//! ```rust
//! let md = web2md::html_to_markdown(
//!     "<h1>Intro</h1><p>Hello   world</p>",
//!     "https://example.com/js/intro.htm",
//! );
//! assert_eq!(md, "# Intro\n\nHello world\n");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `web2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! web2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod links;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod scrape;
pub mod transduce;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImageMode, LinkConfig, PdfConfig, ScrapeConfig, ScrapeConfigBuilder};
pub use error::{ChapterError, Web2MdError};
pub use links::{extract_links, extract_links_to_file, read_link_list};
pub use output::{
    ChapterResult, LinkOutput, PdfFileResult, PdfOutput, ScrapeOutput, ScrapeStats,
};
pub use pdf::{convert_dir, markdown_to_pdf};
pub use pipeline::fetch::{Fetcher, HttpFetcher};
pub use pipeline::parse::ContentNode;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use scrape::{scrape_chapters, scrape_from_file};
pub use transduce::{html_to_markdown, Transducer, Transduction};

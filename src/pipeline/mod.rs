//! Pipeline stages shared by the scrape and PDF commands.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without the network or the filesystem of the others.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ parse ──▶ images ──▶ render ──▶ write          (scrape)
//! (HTTP)    (HTML)    (download)  (Markdown)  (atomic)
//!
//! markdown ──▶ genpdf layout ──▶ write                     (pdf)
//! ```
//!
//! 1. [`fetch`]  — the [`fetch::Fetcher`] seam and its reqwest implementation;
//!    the only stage with network I/O
//! 2. [`parse`]  — walk the chapter HTML into ordered content nodes
//! 3. [`images`] — resolve image URLs, pick unique file names, download
//! 4. [`render`] — format nodes as Markdown fragments
//! 5. [`write`]  — output directories, title sanitising, atomic writes
//! 6. [`markdown`] — fold Markdown into layout blocks for the PDF converter

pub mod fetch;
pub mod images;
pub mod markdown;
pub mod parse;
pub mod render;
pub mod write;

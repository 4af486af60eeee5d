//! Markdown → PDF batch converter.
//!
//! Every `*.md` file directly inside `docs_dir` becomes `<stem>.pdf` inside
//! `pdf_dir`. Files are laid out concurrently (`concurrency` at a time) on
//! the blocking pool because genpdf is CPU-bound and synchronous. A file
//! that fails is reported in its [`PdfFileResult`]; only a missing source
//! directory, an uncreatable output directory or unloadable fonts abort
//! the batch.

use crate::config::PdfConfig;
use crate::error::Web2MdError;
use crate::output::{PdfFileResult, PdfOutput};
use crate::pipeline::markdown::{document_title, markdown_to_blocks, Block, Span};
use crate::pipeline::write;
use futures::stream::{self, StreamExt};
use genpdf::elements::{Break, FramedElement, LinearLayout, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::Style;
use genpdf::Element as _;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fonts shared by every document of a batch.
pub type Fonts = FontFamily<FontData>;

const NBSP: char = '\u{a0}';

/// Load `<font_family>-{Regular,Bold,Italic,BoldItalic}.ttf` from `font_dir`.
pub fn load_fonts(config: &PdfConfig) -> Result<Fonts, Web2MdError> {
    genpdf::fonts::from_files(&config.font_dir, &config.font_family, None).map_err(|e| {
        Web2MdError::FontLoadFailed {
            dir: config.font_dir.clone(),
            family: config.font_family.clone(),
            detail: e.to_string(),
        }
    })
}

/// `*.md` files directly inside `dir`, sorted by name.
pub async fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, Web2MdError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Web2MdError::from_read(dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Web2MdError::from_read(dir, e))?
    {
        let path = entry.path();
        let is_md = path.extension().is_some_and(|ext| ext == "md");
        if is_md && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for `source`: same stem, `.pdf`, inside `pdf_dir`.
pub fn pdf_path(pdf_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    pdf_dir.join(format!("{stem}.pdf"))
}

/// Convert every Markdown file in `config.docs_dir`.
///
/// Returns `Ok` even when files failed; check `output.failed`.
pub async fn convert_dir(config: &PdfConfig) -> Result<PdfOutput, Web2MdError> {
    let start = Instant::now();
    config.validate()?;

    let sources = list_markdown_files(&config.docs_dir).await?;
    info!(
        "Found {} Markdown files in {}",
        sources.len(),
        config.docs_dir.display()
    );
    write::ensure_dir(&config.pdf_dir).await?;

    let total = sources.len();
    if total == 0 {
        return Ok(PdfOutput {
            files: Vec::new(),
            converted: 0,
            failed: 0,
            total_duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    let fonts = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || load_fonts(&config))
            .await
            .map_err(|e| Web2MdError::Internal(format!("font loader panicked: {e}")))??
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut files: Vec<PdfFileResult> = stream::iter(sources.into_iter().enumerate().map(
        |(i, source)| {
            let fonts = fonts.clone();
            let index = i + 1;
            async move {
                let label = source.display().to_string();
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_start(index, total, &label);
                }
                let result = convert_one(&source, fonts, config).await;
                match &result.error {
                    None => {
                        info!("Saved PDF: {}", result.output.display());
                        if let Some(ref cb) = config.progress_callback {
                            let written = result.output.display().to_string();
                            cb.on_item_complete(index, total, &written, result.bytes);
                        }
                    }
                    Some(e) => {
                        warn!("Failed to convert {}: {}", label, e);
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_item_error(index, total, e);
                        }
                    }
                }
                result
            }
        },
    ))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    files.sort_by(|a, b| a.source.cmp(&b.source));
    let converted = files.iter().filter(|f| f.error.is_none()).count();
    let failed = total - converted;
    info!(
        "PDF conversion complete: {}/{} files written to {}",
        converted,
        total,
        config.pdf_dir.display()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, converted);
    }

    Ok(PdfOutput {
        files,
        converted,
        failed,
        total_duration_ms: start.elapsed().as_millis() as u64,
    })
}

async fn convert_one(source: &Path, fonts: Fonts, config: &PdfConfig) -> PdfFileResult {
    let start = Instant::now();
    let output = pdf_path(&config.pdf_dir, source);
    let (bytes, error) = match convert_file(source, &output, fonts, config).await {
        Ok(bytes) => (bytes, None),
        Err(e) => (0, Some(e.to_string())),
    };
    PdfFileResult {
        source: source.to_path_buf(),
        output,
        bytes,
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    }
}

/// Convert one Markdown file to `output`, returning the PDF size.
pub async fn convert_file(
    source: &Path,
    output: &Path,
    fonts: Fonts,
    config: &PdfConfig,
) -> Result<usize, Web2MdError> {
    let markdown = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| Web2MdError::from_read(source, e))?;
    let fallback_title = source
        .file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default();

    let layout_config = config.clone();
    let out = output.to_path_buf();
    let pdf = tokio::task::spawn_blocking(move || {
        markdown_to_pdf(&markdown, &fallback_title, fonts, &layout_config).map_err(|detail| {
            Web2MdError::PdfRenderFailed { path: out, detail }
        })
    })
    .await
    .map_err(|e| Web2MdError::PdfRenderFailed {
        path: output.to_path_buf(),
        detail: format!("layout task panicked: {e}"),
    })??;

    write::write_atomic(output, &pdf).await?;
    Ok(pdf.len())
}

/// Lay out `markdown` and render the PDF into memory.
///
/// The document title is the first `# ` heading, else `fallback_title`.
pub fn markdown_to_pdf(
    markdown: &str,
    fallback_title: &str,
    fonts: Fonts,
    config: &PdfConfig,
) -> Result<Vec<u8>, String> {
    let blocks = markdown_to_blocks(markdown);
    let title = document_title(&blocks).unwrap_or(fallback_title).to_string();
    debug!("Laying out '{}' ({} blocks)", title, blocks.len());

    let mut doc = genpdf::Document::new(fonts);
    doc.set_title(title);
    doc.set_font_size(config.font_size);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(i32::from(config.margin_mm));
    doc.set_page_decorator(decorator);

    for block in &blocks {
        push_block(&mut doc, block, config.font_size);
    }

    let mut buf = Vec::new();
    doc.render(&mut buf).map_err(|e| e.to_string())?;
    Ok(buf)
}

fn heading_size(base: u8, level: u8) -> u8 {
    let bump = match level {
        1 => 9,
        2 => 5,
        3 => 3,
        _ => 1,
    };
    base.saturating_add(bump)
}

fn span_style(span: &Span) -> Style {
    let mut style = Style::new();
    if span.bold {
        style = style.bold();
    }
    if span.italic || span.code {
        style = style.italic();
    }
    style
}

fn spans_paragraph(prefix: Option<&str>, spans: &[Span]) -> Paragraph {
    let mut p = Paragraph::default();
    if let Some(prefix) = prefix {
        p.push(prefix.to_string());
    }
    for span in spans {
        p.push_styled(span.text.clone(), span_style(span));
    }
    p
}

/// Leading spaces survive line layout only as non-breaking spaces.
fn code_line(line: &str) -> String {
    let trimmed = line.trim_start_matches(' ');
    let indent = line.len() - trimmed.len();
    let mut out: String = std::iter::repeat(NBSP).take(indent).collect();
    out.push_str(&trimmed.replace('\t', "    "));
    if out.is_empty() {
        out.push(NBSP);
    }
    out
}

fn push_block(doc: &mut genpdf::Document, block: &Block, base_size: u8) {
    match block {
        Block::Heading { level, text } => {
            let style = Style::new()
                .bold()
                .with_font_size(heading_size(base_size, *level));
            doc.push(Paragraph::new(text.clone()).styled(style));
            doc.push(Break::new(0.5));
        }
        Block::Paragraph(spans) => {
            doc.push(spans_paragraph(None, spans));
            doc.push(Break::new(0.5));
        }
        Block::ListItem(spans) => {
            doc.push(spans_paragraph(Some("• "), spans).padded(genpdf::Margins::trbl(0, 0, 0, 4)));
        }
        Block::Code(code) => {
            let size = base_size.saturating_sub(2).max(6);
            let mut layout = LinearLayout::vertical();
            for line in code.trim_end_matches('\n').lines() {
                let line = Paragraph::new(code_line(line)).styled(Style::new().with_font_size(size));
                layout.push(line);
            }
            doc.push(FramedElement::new(layout.padded(genpdf::Margins::trbl(1, 2, 1, 2))));
            doc.push(Break::new(0.5));
        }
        Block::Image { alt, target } => {
            let caption = format!("[{alt}] {target}");
            doc.push(Paragraph::new(caption).styled(Style::new().italic()));
            doc.push(Break::new(0.5));
        }
        Block::Rule => doc.push(Break::new(1)),
    }
}

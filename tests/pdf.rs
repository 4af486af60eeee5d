//! PDF batch integration tests.
//!
//! Fonts come from the DejaVu Serif family checked in under
//! `tests/fixtures/fonts`, so these run without any local setup.

use std::path::{Path, PathBuf};
use web2md::{convert_dir, markdown_to_pdf, PdfConfig};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn font_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts")
}

fn config(root: &Path) -> PdfConfig {
    PdfConfig {
        docs_dir: root.join("docs"),
        pdf_dir: root.join("pdfs"),
        font_dir: font_dir(),
        font_family: "DejaVuSerif".to_string(),
        concurrency: 2,
        ..PdfConfig::default()
    }
}

fn assert_pdf(path: &Path) {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"%PDF"), "{} is not a PDF", path.display());
}

const CHAPTER: &str = "# Functions\n\n## Declaring\n\nA **function** is *declared* with `function`.\n\n\
```javascript\nfunction add(a, b) {\n    return a + b;\n}\n```\n\n- one\n- two\n\n---\n\n\
![Diagram](images/diagram.png)\n";

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn lays_out_every_block_kind() {
    let config = config(Path::new("."));
    let fonts = web2md::pdf::load_fonts(&config).unwrap();
    let pdf = markdown_to_pdf(CHAPTER, "Functions", fonts, &config).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn one_bad_file_does_not_stop_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    std::fs::create_dir(&docs).unwrap();
    std::fs::write(docs.join("a.md"), CHAPTER).unwrap();
    std::fs::write(docs.join("b.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
    std::fs::write(docs.join("c.md"), "# Last\n\nDone.\n").unwrap();

    let out = convert_dir(&config(tmp.path())).await.unwrap();

    assert_eq!(out.converted, 2);
    assert_eq!(out.failed, 1);
    let sources: Vec<PathBuf> = out.files.iter().map(|f| f.source.clone()).collect();
    assert_eq!(
        sources,
        vec![docs.join("a.md"), docs.join("b.md"), docs.join("c.md")]
    );
    assert!(out.files[0].error.is_none());
    assert!(out.files[1].error.is_some());
    assert!(out.files[2].error.is_none());

    let pdfs = tmp.path().join("pdfs");
    assert_pdf(&pdfs.join("a.pdf"));
    assert_pdf(&pdfs.join("c.pdf"));
    assert!(!pdfs.join("b.pdf").exists());
    let written = std::fs::metadata(pdfs.join("a.pdf")).unwrap().len();
    assert_eq!(out.files[0].bytes as u64, written);
}
